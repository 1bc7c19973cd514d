//! GitHub Sentinel CLI
//!
//! Main entry point for the `sentinel` binary.

mod app;
mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sentinel_core::{LogLevel, RepositoryRef};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Tracks GitHub repository activity and writes AI progress reports"
)]
struct Cli {
    /// Configuration file (default: ~/.sentinel/config.toml)
    #[arg(long, global = true, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror log output to stdout
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level: error, warn, info, debug or trace (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Subscribe to a repository ("owner/name")
    Add { repo: RepositoryRef },
    /// Unsubscribe from a repository
    Remove { repo: RepositoryRef },
    /// List subscribed repositories
    List,
    /// Fetch activity and refresh the export cache
    Export(SpanArgs),
    /// Generate AI reports from the export cache
    Report {
        #[command(flatten)]
        span: SpanArgs,
        /// Also send a notification for each repository with activity
        #[arg(long)]
        notify: bool,
        /// Fetch missing cache artifacts without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Export then report, for every subscription
    Workflow {
        #[command(flatten)]
        span: SpanArgs,
    },
    /// Check that the configured LLM provider is reachable
    Probe,
    /// Run scheduled notifications until interrupted
    Daemon,
}

/// Repository and period selection shared by export, report and workflow
#[derive(Debug, Clone, Args)]
pub struct SpanArgs {
    /// Single repository; defaults to every subscription
    #[arg(long)]
    pub repo: Option<RepositoryRef>,
    /// Last day of the period, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Number of days ending on --date
    #[arg(long, default_value_t = 1)]
    pub days: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = match cli.command {
        Command::Daemon => app::InitOptions::daemon(),
        _ => app::InitOptions::command().with_stdout(cli.verbose),
    }
    .with_log_level(cli.log_level);
    let ctx = app::initialize(options, cli.config.as_deref())?;

    match cli.command {
        Command::Add { repo } => commands::subscriptions::add(&ctx, &repo),
        Command::Remove { repo } => commands::subscriptions::remove(&ctx, &repo),
        Command::List => commands::subscriptions::list(&ctx),
        Command::Export(span) => commands::export::run(&ctx, &span).await,
        Command::Report { span, notify, yes } => {
            commands::report::run(&ctx, &span, commands::report::ReportFlags { notify, yes }).await
        }
        Command::Workflow { span } => commands::workflow::run(&ctx, &span).await,
        Command::Probe => commands::probe::run(&ctx).await,
        Command::Daemon => commands::daemon::run(&ctx).await,
    }
}
