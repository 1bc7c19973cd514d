//! GitHub REST API collector
//!
//! Implements `ActivityCollectorPort` against the GitHub v3 REST API.
//! Commits are filtered server-side with `since`/`until`; issues and pull
//! requests are filtered locally on `updated_at` (falling back to
//! `created_at`) so that both ends of the span are inclusive whole days.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use sentinel_core::api_key::SecretApiKey;
use sentinel_core::ports::activity::{
    ActivityCollectorPort, ActivitySnapshot, CommitRecord, DateSpan, FetchError, IssueRecord,
    PullRequestRecord, RepositoryRef,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Items requested per page
const PER_PAGE: &str = "100";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("github-sentinel/", env!("CARGO_PKG_VERSION"));

/// GitHub activity collector
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<SecretApiKey>,
    state: String,
}

impl GitHubClient {
    /// Creates a collector
    ///
    /// # Arguments
    /// * `token` - Personal access token; unauthenticated requests are heavily rate limited
    /// * `base_url` - API root, e.g. `https://api.github.com`
    /// * `state` - Issue and pull request state filter ("open", "closed" or "all")
    ///
    /// # Errors
    /// Returns `FetchError::RequestFailed` if the HTTP client cannot be built
    pub fn new(
        token: Option<SecretApiKey>,
        base_url: impl Into<String>,
        state: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        if token.is_none() {
            warn!("GITHUB_TOKEN is not set; GitHub requests are unauthenticated");
        }

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            state: state.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        repo: &RepositoryRef,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo, endpoint);
        debug!(url = %url, "Sending request to GitHub API");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token.expose()));
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Failed to send request to GitHub API");
            FetchError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                error!(error = %e, endpoint, "Failed to parse GitHub API response");
                FetchError::InvalidResponse(e.to_string())
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(map_status(status, &body, repo))
    }

    async fn fetch_commits(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
    ) -> Result<Vec<CommitRecord>, FetchError> {
        let (since, until) = span_bounds(span);
        let items: Vec<CommitItem> = self
            .get_json(
                repo,
                "commits",
                &[
                    ("per_page", PER_PAGE.to_string()),
                    ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ],
            )
            .await?;
        Ok(commit_records(items))
    }

    async fn fetch_issues(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
    ) -> Result<Vec<IssueRecord>, FetchError> {
        let (since, _) = span_bounds(span);
        let items: Vec<IssueItem> = self
            .get_json(
                repo,
                "issues",
                &[
                    ("state", self.state.clone()),
                    ("per_page", PER_PAGE.to_string()),
                    ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ],
            )
            .await?;
        Ok(issue_records(items, span))
    }

    async fn fetch_pull_requests(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
    ) -> Result<Vec<PullRequestRecord>, FetchError> {
        let items: Vec<PullItem> = self
            .get_json(
                repo,
                "pulls",
                &[
                    ("state", self.state.clone()),
                    ("per_page", PER_PAGE.to_string()),
                ],
            )
            .await?;
        Ok(pull_request_records(items, span))
    }
}

#[async_trait]
impl ActivityCollectorPort for GitHubClient {
    async fn fetch(
        &self,
        repo: &RepositoryRef,
        span: DateSpan,
    ) -> Result<ActivitySnapshot, FetchError> {
        if repo.is_hacker_news() {
            return Err(FetchError::Unsupported(format!(
                "'{}' is not a GitHub repository",
                repo
            )));
        }

        let commits = self.fetch_commits(repo, &span).await?;
        let issues = self.fetch_issues(repo, &span).await?;
        let pull_requests = self.fetch_pull_requests(repo, &span).await?;

        info!(
            repo = %repo,
            span = %span,
            commits = commits.len(),
            issues = issues.len(),
            pull_requests = pull_requests.len(),
            "Fetched updates from GitHub"
        );

        Ok(ActivitySnapshot::new(commits, issues, pull_requests))
    }
}

/// Start of the first day and start of the day after the last, in UTC
fn span_bounds(span: &DateSpan) -> (DateTime<Utc>, DateTime<Utc>) {
    let since = span.start().and_time(NaiveTime::MIN).and_utc();
    let until = (span.end() + ChronoDuration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (since, until)
}

fn in_span(timestamp: DateTime<Utc>, span: &DateSpan) -> bool {
    let (since, until) = span_bounds(span);
    since <= timestamp && timestamp < until
}

fn map_status(status: StatusCode, body: &str, repo: &RepositoryRef) -> FetchError {
    match status.as_u16() {
        401 => {
            error!("GitHub API authentication failed");
            FetchError::Unauthorized
        }
        403 if body.to_lowercase().contains("rate limit") => {
            warn!("GitHub API rate limit exceeded");
            FetchError::RateLimited
        }
        429 => {
            warn!("GitHub API rate limit exceeded");
            FetchError::RateLimited
        }
        404 => FetchError::NotFound(repo.to_string()),
        _ => {
            error!(status = %status, body = %body, "GitHub API error");
            FetchError::RequestFailed(format!("HTTP {}: {}", status, body))
        }
    }
}

fn commit_records(items: Vec<CommitItem>) -> Vec<CommitRecord> {
    items
        .into_iter()
        .map(|item| {
            let author = item.commit.author.unwrap_or_default();
            CommitRecord {
                sha: item.sha,
                message: item
                    .commit
                    .message
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                author: author.name.unwrap_or_else(|| "Unknown".to_string()),
                timestamp: author.date,
            }
        })
        .collect()
}

fn issue_records(items: Vec<IssueItem>, span: &DateSpan) -> Vec<IssueRecord> {
    items
        .into_iter()
        // The issues endpoint also returns pull requests
        .filter(|item| item.pull_request.is_none())
        .filter_map(|item| {
            let touched = item.updated_at.or(item.created_at)?;
            in_span(touched, span).then(|| IssueRecord {
                number: item.number,
                title: item.title,
                state: item.state,
                updated_at: Some(touched),
            })
        })
        .collect()
}

fn pull_request_records(items: Vec<PullItem>, span: &DateSpan) -> Vec<PullRequestRecord> {
    items
        .into_iter()
        .filter_map(|item| {
            let touched = item.updated_at.or(item.created_at)?;
            in_span(touched, span).then(|| PullRequestRecord {
                number: item.number,
                title: item.title,
                state: item.state,
                updated_at: Some(touched),
            })
        })
        .collect()
}

// === Response Types ===

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Debug, Default, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    number: u64,
    title: String,
    state: String,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullItem {
    number: u64,
    title: String,
    state: String,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}
