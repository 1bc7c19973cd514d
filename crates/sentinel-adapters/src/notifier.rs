//! Webhook notifier
//!
//! Posts rendered notification reports as JSON to a configured URL.

use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::ports::activity::RepositoryRef;
use sentinel_core::ports::notify::NotifierPort;
use std::time::Duration;
use tracing::{error, info, warn};

/// Request timeout in seconds
const TIMEOUT_SECS: u64 = 10;

/// Notifier delivering reports to a webhook
///
/// With no URL configured every notification is logged and dropped.
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// A blank `url` counts as unconfigured
    ///
    /// # Errors
    /// Returns the `reqwest` error if the HTTP client cannot be built
    pub fn new(url: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

fn format_payload(report: &str, repo: &RepositoryRef) -> serde_json::Value {
    serde_json::json!({
        "subject": format!("GitHub Sentinel Report - {}", repo),
        "repository": repo.as_str(),
        "report": report,
    })
}

#[async_trait]
impl NotifierPort for WebhookNotifier {
    async fn notify(&self, report: &str, repo: &RepositoryRef) {
        let Some(url) = &self.url else {
            warn!(repo = %repo, "No notification webhook configured; report not sent");
            return;
        };

        let result = self
            .client
            .post(url)
            .json(&format_payload(report, repo))
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => info!(repo = %repo, "Notification delivered"),
            Err(e) => error!(repo = %repo, error = %e, "Failed to deliver notification"),
        }
    }
}
