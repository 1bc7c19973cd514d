//! Activity collector port definition
//!
//! Defines the repository activity model (commits, issues, pull requests)
//! and the port through which a collector fetches it for a date span.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reference value for the Hacker News feed
pub const HACKER_NEWS_REF: &str = "hackernews";

/// Identifier of a tracked repository (`owner/name`) or the `hackernews` feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryRef(String);

impl RepositoryRef {
    /// Creates a repository reference
    ///
    /// # Returns
    /// * `Some(RepositoryRef)` for a non-empty identifier (surrounding whitespace trimmed)
    /// * `None` if the identifier is empty or whitespace-only
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the identifier exactly as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this reference names the Hacker News feed rather than a repository
    pub fn is_hacker_news(&self) -> bool {
        self.0.eq_ignore_ascii_case(HACKER_NEWS_REF)
    }

    /// Directory name used for this reference in the cache and report trees
    ///
    /// Both `/` and `-` become `_`, so `acme/my-lib` maps to `acme_my_lib`.
    pub fn cache_dir_name(&self) -> String {
        self.0.replace(['/', '-'], "_")
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RepositoryRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| "Repository name cannot be empty".to_string())
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepositoryRef> for String {
    fn from(value: RepositoryRef) -> Self {
        value.0
    }
}

/// Inclusive calendar-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

/// Errors raised when building a [`DateSpan`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateSpanError {
    /// The start date falls after the end date
    #[error("Invalid date span: start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    /// A span must cover at least one day
    #[error("Invalid date span: days must be >= 1")]
    ZeroDays,
}

impl DateSpan {
    /// Creates a span from explicit inclusive bounds
    ///
    /// # Errors
    /// Returns `DateSpanError::StartAfterEnd` when `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateSpanError> {
        if start > end {
            return Err(DateSpanError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// A one-day span
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days`-long span whose last day is `end`
    ///
    /// # Errors
    /// Returns `DateSpanError::ZeroDays` when `days == 0`
    pub fn ending_on(end: NaiveDate, days: u32) -> Result<Self, DateSpanError> {
        if days == 0 {
            return Err(DateSpanError::ZeroDays);
        }
        let start = end - Duration::days(i64::from(days) - 1);
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends
    pub fn days(&self) -> u32 {
        // start <= end is guaranteed by construction
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Whether the span covers exactly one day
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// Whether `date` falls within the span
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.end)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

/// A single commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit SHA
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    /// Author display name
    pub author: String,
    /// Authoring time, when the collector reports one
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommitRecord {
    /// The abbreviated (8 character) SHA
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }
}

/// A single issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-category counts of an activity snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub commits: usize,
    pub issues: usize,
    pub pull_requests: usize,
}

impl ActivitySummary {
    /// Sum of all categories
    pub fn total(&self) -> usize {
        self.commits + self.issues + self.pull_requests
    }
}

/// Result of one fetch for a repository over a date span
///
/// Records keep the order the collector returned them in. The summary is
/// derived once at construction and cannot drift from the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    commits: Vec<CommitRecord>,
    issues: Vec<IssueRecord>,
    pull_requests: Vec<PullRequestRecord>,
    summary: ActivitySummary,
}

impl ActivitySnapshot {
    /// Creates a snapshot from fetched records
    pub fn new(
        commits: Vec<CommitRecord>,
        issues: Vec<IssueRecord>,
        pull_requests: Vec<PullRequestRecord>,
    ) -> Self {
        let summary = ActivitySummary {
            commits: commits.len(),
            issues: issues.len(),
            pull_requests: pull_requests.len(),
        };
        Self {
            commits,
            issues,
            pull_requests,
            summary,
        }
    }

    /// A snapshot with no records at all
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    pub fn pull_requests(&self) -> &[PullRequestRecord] {
        &self.pull_requests
    }

    pub fn summary(&self) -> ActivitySummary {
        self.summary
    }
}

/// Errors that can occur while fetching repository activity
#[derive(Debug, Error)]
pub enum FetchError {
    /// Token missing, expired or lacking scope
    #[error("Unauthorized: GitHub token is missing or invalid. Set GITHUB_TOKEN.")]
    Unauthorized,

    /// Repository does not exist or is not visible to the token
    #[error("Repository not found: {0}")]
    NotFound(String),

    /// API rate limit reached
    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    /// Transport-level failure or unexpected status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The collector cannot serve this kind of reference
    #[error("Unsupported source: {0}")]
    Unsupported(String),
}

/// Port for fetching repository activity
#[async_trait]
pub trait ActivityCollectorPort: Send + Sync {
    /// Fetches commits, issues and pull requests of `repo` within `span`
    async fn fetch(
        &self,
        repo: &RepositoryRef,
        span: DateSpan,
    ) -> Result<ActivitySnapshot, FetchError>;
}
