//! Report command
//!
//! Handles `sentinel report`: turns export cache artifacts into AI reports,
//! fetching missing artifacts on demand.

use super::{
    build_collector, build_llm, build_orchestrator, print_failures, resolve_span, target_repos,
};
use crate::app::AppContext;
use crate::SpanArgs;
use anyhow::{bail, Context, Result};
use sentinel_adapters::WebhookNotifier;
use sentinel_core::{
    BatchSummary, DateSpan, FetchConfirmation, FetchPolicy, NotifierPort, ReportKind,
    ReportOutcome, RepositoryRef,
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFlags {
    /// Send each generated report through the notifier
    pub notify: bool,
    /// Fetch missing cache artifacts without asking
    pub yes: bool,
}

/// Asks on the terminal before fetching a missing cache artifact
struct TerminalConfirmation;

impl FetchConfirmation for TerminalConfirmation {
    fn confirm_fetch(&self, repo: &RepositoryRef, span: &DateSpan, cache_path: &Path) -> bool {
        println!(
            "No export found for {} ({}) at {}",
            repo,
            span,
            cache_path.display()
        );
        print!("Fetch it from GitHub now? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

/// Only an explicit yes allows the fetch
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Only single-repository runs on a terminal ask before fetching
fn fetch_policy(repo_count: usize, flags: ReportFlags, interactive: bool) -> FetchPolicy {
    if repo_count == 1 && !flags.yes && interactive {
        FetchPolicy::Confirm(Arc::new(TerminalConfirmation))
    } else {
        FetchPolicy::Unconditional
    }
}

pub async fn run(ctx: &AppContext, args: &SpanArgs, flags: ReportFlags) -> Result<()> {
    if !ctx.config.reports.enabled {
        println!("Report generation is disabled ([reports] enabled = false)");
        return Ok(());
    }

    let span = resolve_span(args)?;
    let repos = target_repos(ctx, args)?;
    let policy = fetch_policy(repos.len(), flags, io::stdin().is_terminal());
    let summary = generate(ctx, &repos, &span, policy).await?;

    if flags.notify {
        let notifier = WebhookNotifier::new(ctx.config.notification.webhook_url.clone())
            .context("Failed to create webhook client")?;
        for outcome in summary.items.iter().filter_map(|item| item.result.as_ref().ok()) {
            if outcome.kind == ReportKind::Generated {
                notifier.notify(&outcome.text, &outcome.repo).await;
            }
        }
    }

    Ok(())
}

/// Probes the provider, then runs and prints the report batch
///
/// # Errors
/// Fails before any report is written if the provider is unavailable
pub async fn generate(
    ctx: &AppContext,
    repos: &[RepositoryRef],
    span: &DateSpan,
    policy: FetchPolicy,
) -> Result<BatchSummary<ReportOutcome>> {
    let provider = build_llm(ctx)?;
    let outcome = provider.probe().await;
    if !outcome.available {
        eprintln!("{}", outcome.message);
        bail!(
            "{} is not available; no reports were generated",
            provider.kind().display_name()
        );
    }

    let orchestrator = build_orchestrator(ctx, provider, build_collector(ctx)?);
    println!("Generating reports for {} repositories ({})...", repos.len(), span);
    let summary = orchestrator.run_batch(repos, span, &policy).await;

    for outcome in summary.items.iter().filter_map(|item| item.result.as_ref().ok()) {
        let note = match outcome.kind {
            ReportKind::Generated => "",
            ReportKind::Skipped => " (no meaningful activity)",
            ReportKind::GenerationFailed => " (generation failed)",
        };
        println!("  ✓ {}: {}{}", outcome.repo, outcome.path.display(), note);
    }
    print_failures(&summary);
    println!("Reports: {}", summary.tally());

    Ok(summary)
}
