//! Notification gate
//!
//! Decides from a freshly fetched snapshot whether a notification is worth
//! sending and renders the notification body. Never reads or writes the
//! export cache or report trees.

use crate::classifier::Classify;
use crate::ports::activity::{ActivitySnapshot, DateSpan, RepositoryRef};
use crate::ports::notify::NotifierPort;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// Records listed per category before the remainder is summarized
const MAX_LISTED: usize = 5;

/// What the gate did for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationDecision {
    /// A report was rendered and handed to the notifier
    Sent(String),
    /// The snapshot had no activity
    Suppressed,
}

/// Sends notification reports for snapshots with meaningful activity
pub struct NotificationGate {
    notifier: Arc<dyn NotifierPort>,
}

impl NotificationGate {
    pub fn new(notifier: Arc<dyn NotifierPort>) -> Self {
        Self { notifier }
    }

    pub fn should_notify(snapshot: &ActivitySnapshot) -> bool {
        snapshot.is_meaningful()
    }

    /// Renders and sends the report for `snapshot` if it is meaningful
    pub async fn process(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
        snapshot: &ActivitySnapshot,
    ) -> NotificationDecision {
        if !Self::should_notify(snapshot) {
            info!(repo = %repo, span = %span, "No meaningful activity; notification suppressed");
            return NotificationDecision::Suppressed;
        }

        let report = render_notification_report(repo, snapshot, Local::now());
        self.notifier.notify(&report, repo).await;
        info!(repo = %repo, span = %span, "Notification sent");
        NotificationDecision::Sent(report)
    }
}

/// Renders the notification body for `snapshot`
pub fn render_notification_report(
    repo: &RepositoryRef,
    snapshot: &ActivitySnapshot,
    generated: DateTime<Local>,
) -> String {
    let mut out = String::from("# GitHub Sentinel Update Report\n\n");
    let _ = writeln!(out, "**Repository:** {}  ", repo);
    let _ = writeln!(
        out,
        "**Generated:** {}  \n",
        generated.format("%Y-%m-%d %H:%M:%S")
    );

    let summary = snapshot.summary();
    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "- **Commits:** {}", summary.commits);
    let _ = writeln!(out, "- **Issues:** {}", summary.issues);
    let _ = writeln!(out, "- **Pull Requests:** {}\n", summary.pull_requests);

    let commits = snapshot.commits();
    if !commits.is_empty() {
        let _ = writeln!(out, "## Recent Commits ({})\n", commits.len());
        for commit in commits.iter().take(MAX_LISTED) {
            let first_line = commit.message.lines().next().unwrap_or_default();
            let _ = writeln!(
                out,
                "- **{}** by {}: {}",
                commit.short_sha(),
                commit.author,
                first_line
            );
        }
        push_remainder(&mut out, commits.len(), "commits");
    }

    let issues = snapshot.issues();
    if !issues.is_empty() {
        let _ = writeln!(out, "## Recent Issues ({})\n", issues.len());
        for issue in issues.iter().take(MAX_LISTED) {
            let _ = writeln!(
                out,
                "- **#{}** [{}]: {}",
                issue.number,
                issue.state.to_uppercase(),
                issue.title
            );
        }
        push_remainder(&mut out, issues.len(), "issues");
    }

    let pull_requests = snapshot.pull_requests();
    if !pull_requests.is_empty() {
        let _ = writeln!(out, "## Recent Pull Requests ({})\n", pull_requests.len());
        for pr in pull_requests.iter().take(MAX_LISTED) {
            let _ = writeln!(
                out,
                "- **#{}** [{}]: {}",
                pr.number,
                pr.state.to_uppercase(),
                pr.title
            );
        }
        push_remainder(&mut out, pull_requests.len(), "pull requests");
    }

    out
}

fn push_remainder(out: &mut String, len: usize, noun: &str) {
    if len > MAX_LISTED {
        let _ = writeln!(out, "\n*... and {} more {}*", len - MAX_LISTED, noun);
    }
    out.push('\n');
}
