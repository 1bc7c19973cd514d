//! Daemon command
//!
//! Handles `sentinel daemon`: runs the notification job at startup and then
//! on the configured schedule until Ctrl+C or SIGTERM.

use super::build_collector;
use crate::app::{graceful_shutdown, AppContext};
use anyhow::{bail, Context, Result};
use sentinel_adapters::WebhookNotifier;
use sentinel_core::{DailySchedule, DaemonScheduler, NotificationGate, NotificationJob};
use std::sync::Arc;
use tokio::signal;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let config = ctx.config();
    let schedule =
        DailySchedule::from_config(&config.schedule).context("Invalid [schedule] configuration")?;

    let notifier = WebhookNotifier::new(config.notification.webhook_url.clone())
        .context("Failed to create webhook client")?;
    if !notifier.is_configured() {
        println!("No [notification] webhook_url configured; reports will only be logged");
    }

    let job = NotificationJob::new(
        ctx.subscriptions(),
        build_collector(ctx)?,
        NotificationGate::new(Arc::new(notifier)),
        schedule.frequency_days(),
    );
    let scheduler = DaemonScheduler::new(Arc::new(job), schedule);

    println!("Sentinel daemon started");
    println!(
        "Schedule: every {} day(s) at {}",
        schedule.frequency_days(),
        schedule.at().format("%H:%M")
    );
    println!("Data directory: {}", config.storage.data_dir.display());
    tracing::info!("Sentinel daemon started");

    let reason = match scheduler.run(shutdown_signal()).await {
        Ok(()) => "daemon stopped".to_string(),
        Err(e) => format!("fatal error: {}", e),
    };

    println!("Sentinel daemon stopped");
    if graceful_shutdown(&reason) != 0 {
        bail!("Sentinel daemon exited with {}", reason);
    }
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            println!("\nReceived Ctrl+C, shutting down...");
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            println!("Received SIGTERM, shutting down...");
            tracing::info!("Received SIGTERM signal");
        }
    }
}
