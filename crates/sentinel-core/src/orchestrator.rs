//! Report orchestration
//!
//! Drives a `(repository, span)` request through the pipeline:
//!
//! 1. look up the export cache artifact
//! 2. if missing, fetch through the collector (optionally after confirmation) and persist it
//! 3. read the artifact back and classify it
//! 4. call the LLM provider for meaningful activity, or emit the canned
//!    no-activity report
//! 5. persist the report next to its siblings in the AI report tree
//!
//! Batch entry points process repositories one at a time and isolate failures
//! per repository.

use crate::cache::ExportCacheStore;
use crate::classifier::{Classify, RenderedMarkdown};
use crate::error::StorageError;
use crate::ports::activity::{ActivityCollectorPort, DateSpan, FetchError, RepositoryRef};
use crate::ports::ai::{Generation, LlmProviderPort};
use crate::prompt::PromptBuilder;
use crate::report_store::AiReportStore;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default token budget for report generation
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Phrase carried by every skipped report
pub const NO_MEANINGFUL_ACTIVITY: &str = "No meaningful activity detected.";

/// Errors that abort a single report request
#[derive(Debug, Error)]
pub enum ReportError {
    /// A fetch was needed but no collector was configured
    #[error("No activity collector configured; cannot fetch {repo}")]
    MissingCollector { repo: RepositoryRef },

    /// The cache artifact is missing and the caller declined to fetch it
    #[error("Export cache missing at {} and fetch was declined", .path.display())]
    CacheMiss { path: PathBuf },

    /// The collector failed
    #[error("Failed to fetch {repo}: {source}")]
    Fetch {
        repo: RepositoryRef,
        #[source]
        source: FetchError,
    },

    /// Reading or writing an artifact failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Asked before spending a network call on a cache miss
pub trait FetchConfirmation: Send + Sync {
    /// Returns true to fetch `repo` for `span` and write it to `cache_path`
    fn confirm_fetch(&self, repo: &RepositoryRef, span: &DateSpan, cache_path: &Path) -> bool;
}

/// What to do when the export cache has no artifact
#[derive(Clone)]
pub enum FetchPolicy {
    /// Fetch without asking
    Unconditional,
    /// Ask the confirmation hook first; a refusal ends the request
    Confirm(Arc<dyn FetchConfirmation>),
}

impl fmt::Debug for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPolicy::Unconditional => f.write_str("Unconditional"),
            FetchPolicy::Confirm(_) => f.write_str("Confirm"),
        }
    }
}

/// How the report body came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// The provider produced the report
    Generated,
    /// Nothing meaningful to analyze; the canned report was written
    Skipped,
    /// The provider failed; its error message was written as the report
    GenerationFailed,
}

/// Result of one report request
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub repo: RepositoryRef,
    pub span: DateSpan,
    /// The persisted report body
    pub text: String,
    /// Where the report was written
    pub path: PathBuf,
    /// The export cache artifact the report was built from
    pub cache_path: PathBuf,
    pub kind: ReportKind,
    /// Whether the cache artifact had to be fetched for this request
    pub fetched: bool,
}

/// One repository's result within a batch
#[derive(Debug)]
pub struct BatchItem<T> {
    pub repo: RepositoryRef,
    pub result: Result<T, ReportError>,
}

/// Results of a batch, in input order
#[derive(Debug)]
pub struct BatchSummary<T> {
    pub items: Vec<BatchItem<T>>,
}

impl<T> BatchSummary<T> {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&RepositoryRef, &ReportError)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().err().map(|e| (&item.repo, e)))
    }

    /// "N of M succeeded"
    pub fn tally(&self) -> String {
        format!("{} of {} succeeded", self.succeeded(), self.total())
    }
}

/// Turns cached or freshly fetched activity into persisted reports
pub struct ReportOrchestrator {
    cache: ExportCacheStore,
    reports: AiReportStore,
    provider: Arc<dyn LlmProviderPort>,
    collector: Option<Arc<dyn ActivityCollectorPort>>,
    prompts: PromptBuilder,
    max_tokens: u32,
}

impl ReportOrchestrator {
    /// Creates an orchestrator without a collector
    ///
    /// Without a collector, cache misses fail with `ReportError::MissingCollector`.
    pub fn new(
        cache: ExportCacheStore,
        reports: AiReportStore,
        provider: Arc<dyn LlmProviderPort>,
    ) -> Self {
        Self {
            cache,
            reports,
            provider,
            collector: None,
            prompts: PromptBuilder::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_collector(mut self, collector: Arc<dyn ActivityCollectorPort>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn cache(&self) -> &ExportCacheStore {
        &self.cache
    }

    pub fn reports(&self) -> &AiReportStore {
        &self.reports
    }

    pub fn provider(&self) -> &Arc<dyn LlmProviderPort> {
        &self.provider
    }

    /// Fetches `repo` for `span` and overwrites its cache artifact
    pub async fn refresh_cache(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
    ) -> Result<PathBuf, ReportError> {
        let collector = self
            .collector
            .as_ref()
            .ok_or_else(|| ReportError::MissingCollector { repo: repo.clone() })?;
        export_activity(collector.as_ref(), &self.cache, repo, span).await
    }

    /// Makes sure the cache artifact exists, fetching it under `policy` if not
    ///
    /// # Returns
    /// The artifact path and whether a fetch happened
    pub async fn ensure_cache(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
        policy: &FetchPolicy,
    ) -> Result<(PathBuf, bool), ReportError> {
        let path = self.cache.path_for(repo, span);
        if self.cache.exists(repo, span) {
            debug!(repo = %repo, path = %path.display(), "Export cache hit");
            return Ok((path, false));
        }

        debug!(repo = %repo, path = %path.display(), "Export cache miss");
        if self.collector.is_none() {
            return Err(ReportError::MissingCollector { repo: repo.clone() });
        }

        if let FetchPolicy::Confirm(confirmation) = policy {
            if !confirmation.confirm_fetch(repo, span, &path) {
                info!(repo = %repo, "Fetch declined");
                return Err(ReportError::CacheMiss { path });
            }
        }

        let written = self.refresh_cache(repo, span).await?;
        Ok((written, true))
    }

    /// Produces and persists the report for `(repo, span)`
    ///
    /// # Errors
    /// Fetch and storage failures abort the request. Provider failures do not:
    /// they are written into the report and flagged as `ReportKind::GenerationFailed`.
    pub async fn generate_report(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
        policy: &FetchPolicy,
    ) -> Result<ReportOutcome, ReportError> {
        let (cache_path, fetched) = self.ensure_cache(repo, span, policy).await?;
        let markdown = self.cache.read(repo, span)?;

        let (text, kind) = if RenderedMarkdown(&markdown).is_meaningful() {
            info!(
                repo = %repo,
                provider = %self.provider.kind(),
                model = %self.provider.model(),
                "Generating AI report"
            );
            let prompt = self.prompts.build_report_prompt(&markdown);
            match self.provider.generate(&prompt, self.max_tokens).await {
                Generation::Completed(text) => (text, ReportKind::Generated),
                Generation::Failed(text) => {
                    warn!(repo = %repo, "Report generation failed; persisting error text");
                    (text, ReportKind::GenerationFailed)
                }
            }
        } else {
            info!(repo = %repo, span = %span, "No meaningful activity; skipping AI analysis");
            (render_skipped_report(repo, span), ReportKind::Skipped)
        };

        let path = self.reports.write(repo, span, &text)?;
        info!(repo = %repo, path = %path.display(), kind = ?kind, "Report saved");

        Ok(ReportOutcome {
            repo: repo.clone(),
            span: *span,
            text,
            path,
            cache_path,
            kind,
            fetched,
        })
    }

    /// Generates reports for every repository in turn
    pub async fn run_batch(
        &self,
        repos: &[RepositoryRef],
        span: &DateSpan,
        policy: &FetchPolicy,
    ) -> BatchSummary<ReportOutcome> {
        let mut items = Vec::with_capacity(repos.len());
        for repo in repos {
            let result = self.generate_report(repo, span, policy).await;
            if let Err(e) = &result {
                error!(repo = %repo, error = %e, "Report request failed");
            }
            items.push(BatchItem {
                repo: repo.clone(),
                result,
            });
        }

        let summary = BatchSummary { items };
        info!(tally = %summary.tally(), "Report batch finished");
        summary
    }
}

/// Fetches `repo` for `span` and overwrites its cache artifact
///
/// Needs no LLM provider, so exports work without credentials.
pub async fn export_activity(
    collector: &dyn ActivityCollectorPort,
    cache: &ExportCacheStore,
    repo: &RepositoryRef,
    span: &DateSpan,
) -> Result<PathBuf, ReportError> {
    info!(repo = %repo, span = %span, "Fetching repository activity");
    let snapshot = collector
        .fetch(repo, *span)
        .await
        .map_err(|source| ReportError::Fetch {
            repo: repo.clone(),
            source,
        })?;

    let summary = snapshot.summary();
    info!(
        repo = %repo,
        commits = summary.commits,
        issues = summary.issues,
        pull_requests = summary.pull_requests,
        "Fetched repository activity"
    );

    Ok(cache.write(repo, &snapshot, span)?)
}

/// Runs [`export_activity`] for every repository in turn
pub async fn export_all(
    collector: &dyn ActivityCollectorPort,
    cache: &ExportCacheStore,
    repos: &[RepositoryRef],
    span: &DateSpan,
) -> BatchSummary<PathBuf> {
    let mut items = Vec::with_capacity(repos.len());
    for repo in repos {
        let result = export_activity(collector, cache, repo, span).await;
        if let Err(e) = &result {
            error!(repo = %repo, error = %e, "Export failed");
        }
        items.push(BatchItem {
            repo: repo.clone(),
            result,
        });
    }

    let summary = BatchSummary { items };
    info!(tally = %summary.tally(), "Export batch finished");
    summary
}

/// The canned report for a period without meaningful activity
pub fn render_skipped_report(repo: &RepositoryRef, span: &DateSpan) -> String {
    let (title, period) = if span.is_single_day() {
        (
            "# Daily Report - No Activity".to_string(),
            format!("**Date:** {}", span.end()),
        )
    } else {
        (
            format!("# {}-Day Period Report - No Activity", span.days()),
            format!("**Date Range:** {} to {}", span.start(), span.end()),
        )
    };

    format!(
        "{title}\n\n**Repository:** {repo}\n{period}\n\n**Status:** {NO_MEANINGFUL_ACTIVITY}\n\n\
         The export cache for this period contains no commits, issues or pull requests, \
         so AI analysis was skipped.\n"
    )
}
