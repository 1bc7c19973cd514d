//! OpenAI-compatible chat completions adapter
//!
//! Serves both OpenAI and DeepSeek, which share the `/chat/completions`
//! wire protocol and differ only in base URL and credentials.

use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::api_key::{provider_guidance, ProviderKind, SecretApiKey};
use sentinel_core::ports::ai::{AIError, ChatPrompt, LlmProviderPort, ProbeOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// OpenAI API root
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// DeepSeek API root
pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";

/// Sampling temperature for report generation
const TEMPERATURE: f32 = 0.7;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Chat completions adapter for OpenAI-compatible APIs
pub struct ChatCompletionsAdapter {
    client: Client,
    kind: ProviderKind,
    base_url: String,
    api_key: SecretApiKey,
    model: String,
}

impl ChatCompletionsAdapter {
    /// Creates an adapter talking to `base_url`
    ///
    /// # Errors
    /// Returns `AIError::RequestFailed` if the HTTP client cannot be built
    pub fn new(
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: SecretApiKey,
        model: impl Into<String>,
    ) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AIError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            kind,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    /// OpenAI adapter
    pub fn openai(api_key: SecretApiKey, model: impl Into<String>) -> Result<Self, AIError> {
        Self::new(ProviderKind::OpenAi, OPENAI_API_BASE, api_key, model)
    }

    /// DeepSeek adapter
    pub fn deepseek(api_key: SecretApiKey, model: impl Into<String>) -> Result<Self, AIError> {
        Self::new(ProviderKind::DeepSeek, DEEPSEEK_API_BASE, api_key, model)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &ChatPrompt, max_tokens: u32, temperature: f32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: prompt
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens,
            temperature,
        }
    }

    /// Sends one request; rate limits and other failures are returned as-is
    async fn send_request(&self, request: &ChatRequest) -> Result<String, AIError> {
        debug!(provider = %self.kind, model = %self.model, "Sending chat completions request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %self.kind, error = %e, "Failed to send chat completions request");
                if e.is_connect() || e.is_timeout() {
                    AIError::ConnectionFailed(e.to_string())
                } else {
                    AIError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let body: ChatResponse = response.json().await.map_err(|e| {
                error!(provider = %self.kind, error = %e, "Failed to parse chat completions response");
                AIError::InvalidResponse(e.to_string())
            })?;
            let text = extract_text(body)?;
            debug!(provider = %self.kind, text_length = text.len(), "Received chat completions response");
            return Ok(text);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status.as_u16() {
            401 | 403 => {
                error!(provider = %self.kind, "API authentication failed");
                Err(AIError::Unauthorized)
            }
            429 => {
                warn!(provider = %self.kind, "API rate limit exceeded");
                Err(AIError::RateLimitExceeded)
            }
            400 | 404 => {
                error!(provider = %self.kind, body = %error_body, "Invalid request");
                Err(AIError::InvalidRequest(error_body))
            }
            _ => {
                error!(provider = %self.kind, status = %status, body = %error_body, "API error");
                Err(AIError::ProviderError(self.kind.to_string(), error_body))
            }
        }
    }
}

#[async_trait]
impl LlmProviderPort for ChatCompletionsAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// Sends a one-token request; any successful reply means the key and model work
    async fn probe(&self) -> ProbeOutcome {
        let request = self.build_request(&ChatPrompt::user_only("test"), 1, 0.0);
        match self.send_request(&request).await {
            Ok(_) => ProbeOutcome::available(format!(
                "{} model '{}' is available",
                self.kind.display_name(),
                self.model
            )),
            Err(e) => ProbeOutcome::unavailable(provider_guidance(self.kind, &e.to_string())),
        }
    }

    async fn complete(&self, prompt: &ChatPrompt, max_tokens: u32) -> Result<String, AIError> {
        let request = self.build_request(prompt, max_tokens, TEMPERATURE);
        self.send_request(&request).await
    }
}

fn extract_text(body: ChatResponse) -> Result<String, AIError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AIError::InvalidResponse("No text content in response".to_string()))
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
