//! Meaningful-activity classification
//!
//! One predicate, two inputs: a fetched [`ActivitySnapshot`] and the markdown
//! that [`crate::cache`] renders from it. For every document the cache writes,
//! both answers agree.

use crate::ports::activity::ActivitySnapshot;

/// Title of the canned document written for snapshots without activity
pub const NO_ACTIVITY_TITLE: &str = "# No Activity Report";

/// Empty-section lines in rendered cache documents
pub const NO_COMMITS: &str = "No commits found";
pub const NO_ISSUES: &str = "No issues found";
pub const NO_PULL_REQUESTS: &str = "No pull requests found";

/// Negative indicators searched for in markdown
const NEGATIVE_INDICATORS: [&str; 4] = [NO_COMMITS, NO_ISSUES, NO_PULL_REQUESTS, NO_ACTIVITY_TITLE];

/// Indicator count at which markdown is considered empty
const NOT_MEANINGFUL_THRESHOLD: usize = 3;

/// Decides whether activity is worth analyzing
pub trait Classify {
    fn is_meaningful(&self) -> bool;
}

impl Classify for ActivitySnapshot {
    /// True iff at least one commit, issue or pull request is present
    fn is_meaningful(&self) -> bool {
        self.summary().total() > 0
    }
}

/// Markdown read back from the export cache
#[derive(Debug, Clone, Copy)]
pub struct RenderedMarkdown<'a>(pub &'a str);

impl RenderedMarkdown<'_> {
    /// Number of distinct negative indicators present
    pub fn negative_indicator_count(&self) -> usize {
        NEGATIVE_INDICATORS
            .iter()
            .filter(|indicator| self.0.contains(*indicator))
            .count()
    }
}

impl Classify for RenderedMarkdown<'_> {
    /// Meaningful unless at least three of the four negative indicators appear
    ///
    /// This is a textual proxy: prose that happens to quote three indicator
    /// phrases is classified as empty.
    fn is_meaningful(&self) -> bool {
        self.negative_indicator_count() < NOT_MEANINGFUL_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::activity::{CommitRecord, IssueRecord, PullRequestRecord};

    fn commit() -> CommitRecord {
        CommitRecord {
            sha: "0123456789abcdef".to_string(),
            message: "Add widget".to_string(),
            author: "alice".to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn test_empty_snapshot_is_not_meaningful() {
        assert!(!ActivitySnapshot::empty().is_meaningful());
    }

    #[test]
    fn test_any_category_makes_snapshot_meaningful() {
        let issue = IssueRecord {
            number: 1,
            title: "Crash".to_string(),
            state: "closed".to_string(),
            updated_at: None,
        };
        let pr = PullRequestRecord {
            number: 2,
            title: "Fix crash".to_string(),
            state: "closed".to_string(),
            updated_at: None,
        };

        assert!(ActivitySnapshot::new(vec![commit()], vec![], vec![]).is_meaningful());
        assert!(ActivitySnapshot::new(vec![], vec![issue], vec![]).is_meaningful());
        assert!(ActivitySnapshot::new(vec![], vec![], vec![pr]).is_meaningful());
    }

    #[test]
    fn test_markdown_with_two_indicators_is_meaningful() {
        let md = "## Commits\n- abc\n\n## Issues\nNo issues found.\n\n## Pull Requests\nNo pull requests found.\n";
        assert_eq!(RenderedMarkdown(md).negative_indicator_count(), 2);
        assert!(RenderedMarkdown(md).is_meaningful());
    }

    #[test]
    fn test_markdown_with_three_indicators_is_not_meaningful() {
        let md = "No commits found.\nNo issues found.\nNo pull requests found.\n";
        assert!(!RenderedMarkdown(md).is_meaningful());
    }

    #[test]
    fn test_title_counts_as_indicator() {
        let md = "# No Activity Report for acme/widgets\nNo commits found.\nNo issues found.\n";
        assert_eq!(RenderedMarkdown(md).negative_indicator_count(), 3);
        assert!(!RenderedMarkdown(md).is_meaningful());
    }

    #[test]
    fn test_repeated_phrase_counts_once() {
        let md = "No commits found. No commits found. No commits found.";
        assert_eq!(RenderedMarkdown(md).negative_indicator_count(), 1);
        assert!(RenderedMarkdown(md).is_meaningful());
    }
}
