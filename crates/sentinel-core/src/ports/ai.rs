//! LLM provider port definition

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::error;

use crate::api_key::ProviderKind;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    /// Wire name shared by every supported backend
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

/// One message of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Prompt sent to an LLM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
}

impl ChatPrompt {
    /// A system + user prompt
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    /// A single user message with no system instructions
    pub fn user_only(user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(user)],
        }
    }
}

/// Result of an availability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the provider can serve generation requests
    pub available: bool,
    /// Human-readable diagnostic; carries remediation steps when unavailable
    pub message: String,
}

impl ProbeOutcome {
    pub fn available(message: impl Into<String>) -> Self {
        Self {
            available: true,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
        }
    }
}

/// Outcome of a generation call
///
/// Provider failures are folded into [`Generation::Failed`] holding the text
/// that gets embedded in the persisted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Completed(String),
    Failed(String),
}

impl Generation {
    /// The report body, whichever way generation went
    pub fn text(&self) -> &str {
        match self {
            Generation::Completed(text) | Generation::Failed(text) => text,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Generation::Completed(_))
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum AIError {
    /// API key is missing or invalid
    #[error("Unauthorized: API key is missing or invalid")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Invalid request (e.g., unknown model, bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider-specific error
    #[error("Provider '{0}' error: {1}")]
    ProviderError(String, String),

    /// Could not reach the provider at all
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Port for LLM provider operations
#[async_trait]
pub trait LlmProviderPort: Send + Sync {
    /// Which backend this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Configured model identifier
    fn model(&self) -> &str;

    /// Checks whether the provider can serve requests, without generating a report
    async fn probe(&self) -> ProbeOutcome;

    /// Sends the prompt through the backend's wire protocol
    async fn complete(&self, prompt: &ChatPrompt, max_tokens: u32) -> Result<String, AIError>;

    /// Generates text, normalizing every failure into a [`Generation::Failed`] message
    async fn generate(&self, prompt: &ChatPrompt, max_tokens: u32) -> Generation {
        match self.complete(prompt, max_tokens).await {
            Ok(text) => Generation::Completed(text),
            Err(e) => {
                error!(provider = %self.kind(), model = %self.model(), error = %e, "LLM generation failed");
                Generation::Failed(generation_error_message(self.kind(), &e))
            }
        }
    }
}

/// Formats the user-facing text for a failed generation
pub fn generation_error_message(kind: ProviderKind, err: &AIError) -> String {
    format!("Error generating response with {} LLM: {}", kind, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProviderPort for FailingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::DeepSeek
        }

        fn model(&self) -> &str {
            "deepseek-chat"
        }

        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::unavailable("down")
        }

        async fn complete(&self, _prompt: &ChatPrompt, _max_tokens: u32) -> Result<String, AIError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AIError::RateLimitExceeded)
        }
    }

    #[test]
    fn test_chat_prompt_new_has_system_and_user() {
        let prompt = ChatPrompt::new("sys", "hello");
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, ChatRole::System);
        assert_eq!(prompt.messages[1].role.as_str(), "user");
    }

    #[test]
    fn test_probe_outcome_constructors() {
        assert!(ProbeOutcome::available("ok").available);
        assert!(!ProbeOutcome::unavailable("no").available);
    }

    #[tokio::test]
    async fn test_generate_normalizes_errors() {
        let provider = FailingProvider {
            calls: AtomicUsize::new(0),
        };
        let result = provider.generate(&ChatPrompt::user_only("x"), 10).await;

        assert!(!result.is_completed());
        assert!(result
            .text()
            .starts_with("Error generating response with deepseek LLM:"));
        assert!(result.text().contains("Rate limit"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ai_error_messages() {
        let err = AIError::ProviderError("openai".to_string(), "Server error".to_string());
        assert!(err.to_string().contains("openai"));
        assert!(err.to_string().contains("Server error"));

        let err = AIError::ConnectionFailed("refused".to_string());
        assert!(err.to_string().contains("Connection failed"));
    }
}
