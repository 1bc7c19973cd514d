//! CLI command implementations
//!
//! Each subcommand has its own module with the implementation logic; the
//! helpers here wire configuration into adapters and the orchestrator.

pub mod daemon;
pub mod export;
pub mod probe;
pub mod report;
pub mod subscriptions;
pub mod workflow;

use crate::app::AppContext;
use crate::SpanArgs;
use anyhow::{bail, Context, Result};
use chrono::Local;
use sentinel_adapters::{build_provider, GitHubClient};
use sentinel_core::{
    resolve_provider, ActivityCollectorPort, AiReportStore, BatchSummary, DateSpan,
    ExportCacheStore, LlmProviderPort, PromptBuilder, ReportOrchestrator, RepositoryRef,
};
use std::sync::Arc;

/// The period selected by `--date` and `--days`
pub fn resolve_span(args: &SpanArgs) -> Result<DateSpan> {
    let end = args.date.unwrap_or_else(|| Local::now().date_naive());
    DateSpan::ending_on(end, args.days).context("Invalid --days")
}

/// `--repo` if given, otherwise every subscription
pub fn target_repos(ctx: &AppContext, args: &SpanArgs) -> Result<Vec<RepositoryRef>> {
    if let Some(repo) = &args.repo {
        return Ok(vec![repo.clone()]);
    }
    let store = ctx.subscriptions();
    let repos = store.list()?;
    if repos.is_empty() {
        bail!(
            "No subscriptions in {}. Add one with: sentinel add <owner/name>",
            store.path().display()
        );
    }
    Ok(repos)
}

pub fn build_collector(ctx: &AppContext) -> Result<Arc<dyn ActivityCollectorPort>> {
    let github = &ctx.config.github;
    let client = GitHubClient::new(
        ctx.credentials.github_token.clone(),
        github.api_url.clone(),
        github.issue_state.clone(),
    )
    .context("Failed to create GitHub client")?;
    Ok(Arc::new(client))
}

/// Resolves and builds the configured LLM provider
///
/// # Errors
/// Fails if the selected provider's credential is missing
pub fn build_llm(ctx: &AppContext) -> Result<Arc<dyn LlmProviderPort>> {
    let provider_config = resolve_provider(&ctx.config.llm, &ctx.credentials)?;
    Ok(build_provider(&provider_config)?)
}

pub fn export_cache(ctx: &AppContext) -> ExportCacheStore {
    ExportCacheStore::new(ctx.config.storage.export_cache_dir())
}

pub fn build_orchestrator(
    ctx: &AppContext,
    provider: Arc<dyn LlmProviderPort>,
    collector: Arc<dyn ActivityCollectorPort>,
) -> ReportOrchestrator {
    let prompts = PromptBuilder::load(&ctx.config.storage.prompts_dir(), provider.kind());
    ReportOrchestrator::new(
        export_cache(ctx),
        AiReportStore::new(ctx.config.storage.ai_reports_dir()),
        provider,
    )
    .with_collector(collector)
    .with_prompts(prompts)
    .with_max_tokens(ctx.config.llm.max_tokens)
}

/// Prints each failed repository with its error
pub fn print_failures<T>(summary: &BatchSummary<T>) {
    for (repo, err) in summary.failures() {
        eprintln!("  ✗ {}: {}", repo, err);
    }
}
