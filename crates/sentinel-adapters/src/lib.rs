//! Sentinel Adapters - Infrastructure implementations
//!
//! This crate contains concrete implementations of the ports defined in
//! sentinel-core: the GitHub REST collector, the LLM provider clients and
//! the webhook notifier.

pub mod ai;
pub mod github;
pub mod notifier;

// Re-export primary adapter types
pub use ai::{build_provider, ChatCompletionsAdapter, OllamaAdapter};
pub use github::GitHubClient;
pub use notifier::WebhookNotifier;

#[cfg(test)]
mod tests {
    use sentinel_core::config::Config;

    #[test]
    fn test_can_access_core_types() {
        // Verify that sentinel-adapters can use sentinel-core types
        let config = Config::default();
        assert_eq!(config.github.api_url, super::github::DEFAULT_GITHUB_API_URL);
    }
}
