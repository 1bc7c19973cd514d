//! Export cache
//!
//! Persists the markdown rendering of an [`ActivitySnapshot`] under a path
//! derived from `(repository, span)` alone. The store never fetches; a second
//! write for the same key replaces the document wholesale.

use crate::classifier::{Classify, NO_ACTIVITY_TITLE, NO_COMMITS, NO_ISSUES, NO_PULL_REQUESTS};
use crate::error::StorageError;
use crate::ports::activity::{ActivitySnapshot, DateSpan, RepositoryRef};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the line that differs between two renders of one snapshot
pub const GENERATED_PREFIX: &str = "**Generated:**";

/// Sentence written into the canned no-activity document
pub const NO_SIGNIFICANT_ACTIVITY: &str = "No significant activity found for this period.";

/// File stem of the artifact for `span`: `YYYY-MM-DD` or `YYYY-MM-DD_Ndays`
pub fn artifact_stem(span: &DateSpan) -> String {
    if span.is_single_day() {
        span.end().to_string()
    } else {
        format!("{}_{}days", span.end(), span.days())
    }
}

/// Filesystem store of rendered activity snapshots
#[derive(Debug, Clone)]
pub struct ExportCacheStore {
    root: PathBuf,
}

impl ExportCacheStore {
    /// Creates a store rooted at `root` (usually `reports/exports`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the artifact for `(repo, span)`
    ///
    /// Pure: does not touch the filesystem.
    pub fn path_for(&self, repo: &RepositoryRef, span: &DateSpan) -> PathBuf {
        self.root
            .join(repo.cache_dir_name())
            .join(format!("{}.md", artifact_stem(span)))
    }

    pub fn exists(&self, repo: &RepositoryRef, span: &DateSpan) -> bool {
        self.path_for(repo, span).is_file()
    }

    /// Reads the cached markdown back
    ///
    /// # Errors
    /// * `StorageError::NotFound` - No artifact for this key
    /// * `StorageError::Io` - The artifact could not be read
    pub fn read(&self, repo: &RepositoryRef, span: &DateSpan) -> Result<String, StorageError> {
        let path = self.path_for(repo, span);
        if !path.is_file() {
            return Err(StorageError::NotFound(path));
        }
        fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))
    }

    /// Renders `snapshot` and writes it to `path_for(repo, span)`
    ///
    /// Snapshots without activity are written as the canned no-activity
    /// document. Parent directories are created as needed.
    ///
    /// # Returns
    /// The path that was written
    pub fn write(
        &self,
        repo: &RepositoryRef,
        snapshot: &ActivitySnapshot,
        span: &DateSpan,
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(repo, span);
        let markdown = render_markdown(repo, snapshot, span, Local::now());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        fs::write(&path, markdown).map_err(|e| StorageError::io(&path, e))?;

        debug!(
            repo = %repo,
            span = %span,
            path = %path.display(),
            meaningful = snapshot.is_meaningful(),
            "Wrote export cache artifact"
        );
        Ok(path)
    }
}

/// Renders the cache document for a snapshot
///
/// Sections follow the collector's order; nothing is re-sorted. Only the
/// `**Generated:**` line depends on `generated`.
pub fn render_markdown(
    repo: &RepositoryRef,
    snapshot: &ActivitySnapshot,
    span: &DateSpan,
    generated: DateTime<Local>,
) -> String {
    if !snapshot.is_meaningful() {
        return render_no_activity(repo, span, generated);
    }

    let mut out = String::new();
    if span.is_single_day() {
        let _ = writeln!(out, "# Daily Progress for {} ({})\n", repo, span.end());
        let _ = writeln!(out, "**Date:** {}", span.end());
    } else {
        let _ = writeln!(
            out,
            "# Progress for {} ({} to {})\n",
            repo,
            span.start(),
            span.end()
        );
        let _ = writeln!(
            out,
            "**Date Range:** {} to {} ({} days)",
            span.start(),
            span.end(),
            span.days()
        );
    }
    push_generated(&mut out, generated);

    let summary = snapshot.summary();
    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "- Commits: {}", summary.commits);
    let _ = writeln!(out, "- Issues: {}", summary.issues);
    let _ = writeln!(out, "- Pull Requests: {}\n", summary.pull_requests);

    out.push_str("## Commits\n\n");
    if snapshot.commits().is_empty() {
        let _ = writeln!(out, "{}.", NO_COMMITS);
    }
    for commit in snapshot.commits() {
        let _ = writeln!(
            out,
            "- `{}` {} ({})",
            commit.short_sha(),
            commit.message,
            commit.author
        );
    }

    out.push_str("\n## Issues\n\n");
    if snapshot.issues().is_empty() {
        let _ = writeln!(out, "{}.", NO_ISSUES);
    }
    for issue in snapshot.issues() {
        let _ = writeln!(out, "- #{} {} ({})", issue.number, issue.title, issue.state);
    }

    out.push_str("\n## Pull Requests\n\n");
    if snapshot.pull_requests().is_empty() {
        let _ = writeln!(out, "{}.", NO_PULL_REQUESTS);
    }
    for pr in snapshot.pull_requests() {
        let _ = writeln!(out, "- #{} {} ({})", pr.number, pr.title, pr.state);
    }

    out
}

fn render_no_activity(repo: &RepositoryRef, span: &DateSpan, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} for {}\n", NO_ACTIVITY_TITLE, repo);
    if span.is_single_day() {
        let _ = writeln!(out, "**Date:** {}", span.end());
    } else {
        let _ = writeln!(
            out,
            "**Date Range:** {} to {} ({} days)",
            span.start(),
            span.end(),
            span.days()
        );
    }
    push_generated(&mut out, generated);
    let _ = writeln!(out, "{}\n", NO_SIGNIFICANT_ACTIVITY);
    let _ = writeln!(out, "## Commits\n\n{}.\n", NO_COMMITS);
    let _ = writeln!(out, "## Issues\n\n{}.\n", NO_ISSUES);
    let _ = writeln!(out, "## Pull Requests\n\n{}.", NO_PULL_REQUESTS);
    out
}

fn push_generated(out: &mut String, generated: DateTime<Local>) {
    let _ = writeln!(
        out,
        "{} {}\n",
        GENERATED_PREFIX,
        generated.format("%Y-%m-%d %H:%M:%S")
    );
}
