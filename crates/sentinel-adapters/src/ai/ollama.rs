//! Ollama adapter implementation
//!
//! Talks to a local Ollama server over its native `/api/chat` protocol.

use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::api_key::{provider_guidance, ProviderKind};
use sentinel_core::ports::ai::{AIError, ChatPrompt, LlmProviderPort, ProbeOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Default chat endpoint of a local Ollama server
pub const DEFAULT_OLLAMA_API_URL: &str = "http://localhost:11434/api/chat";

/// Timeout for the model listing request
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Local models can be slow on first load
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Ollama adapter
pub struct OllamaAdapter {
    client: Client,
    api_url: String,
    model: String,
}

impl OllamaAdapter {
    /// Creates a new Ollama adapter
    ///
    /// # Arguments
    /// * `api_url` - Chat endpoint, e.g. `http://localhost:11434/api/chat`
    /// * `model` - Model name as listed by `ollama list`
    ///
    /// # Errors
    /// Returns `AIError::RequestFailed` if the HTTP client cannot be built
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AIError::RequestFailed(e.to_string()))?;

        let api_url = api_url.into();
        let model = model.into();
        info!(api_url = %api_url, model = %model, "Using Ollama API");

        Ok(Self {
            client,
            api_url,
            model,
        })
    }

    /// Model listing endpoint derived from the chat URL
    fn tags_url(&self) -> String {
        self.api_url.replace("/api/chat", "/api/tags")
    }

    fn build_request(&self, prompt: &ChatPrompt, max_tokens: u32) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: prompt
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                num_predict: max_tokens,
            },
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, AIError> {
        let response = self
            .client
            .get(self.tags_url())
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AIError::ConnectionFailed(e.to_string())
                } else {
                    AIError::RequestFailed(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| AIError::RequestFailed(e.to_string()))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AIError::InvalidResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LlmProviderPort for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.list_models().await {
            Ok(names) => model_availability(&self.model, &names),
            Err(AIError::ConnectionFailed(_)) => {
                ProbeOutcome::unavailable(provider_guidance(ProviderKind::Ollama, "Connection failed"))
            }
            Err(e) => ProbeOutcome::unavailable(provider_guidance(ProviderKind::Ollama, &e.to_string())),
        }
    }

    async fn complete(&self, prompt: &ChatPrompt, max_tokens: u32) -> Result<String, AIError> {
        debug!(model = %self.model, "Sending request to Ollama API");

        let response = self
            .client
            .post(&self.api_url)
            .json(&self.build_request(prompt, max_tokens))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Ollama API");
                if e.is_connect() {
                    AIError::ConnectionFailed(e.to_string())
                } else {
                    AIError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, body = %error_body, "Ollama API error");
            return Err(match status.as_u16() {
                400 | 404 => AIError::InvalidRequest(error_body),
                _ => AIError::ProviderError("ollama".to_string(), error_body),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Ollama API response");
            AIError::InvalidResponse(e.to_string())
        })?;
        debug!(response = %body, "Ollama response");
        extract_content(&body)
    }
}

/// Substring match against the listed names, so `llama3.1` matches `llama3.1:latest`
fn model_availability(model: &str, names: &[String]) -> ProbeOutcome {
    if names.iter().any(|name| name.contains(model)) {
        return ProbeOutcome::available(format!("Ollama model '{}' is available", model));
    }
    let listed = if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    };
    ProbeOutcome::unavailable(format!(
        "Ollama model '{model}' is not available.\n   → Download model: ollama pull {model}\n   → Available models: {listed}"
    ))
}

fn extract_content(body: &serde_json::Value) -> Result<String, AIError> {
    body.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error!("Unable to extract content from Ollama response");
            AIError::InvalidResponse("Invalid response structure from Ollama API".to_string())
        })
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_url_is_derived_from_chat_url() {
        let adapter = OllamaAdapter::new("http://gpu-box:11434/api/chat", "llama3.1").unwrap();
        assert_eq!(adapter.tags_url(), "http://gpu-box:11434/api/tags");
    }

    #[test]
    fn test_request_disables_streaming() {
        let adapter = OllamaAdapter::new(DEFAULT_OLLAMA_API_URL, "llama3.1").unwrap();
        let json = serde_json::to_value(adapter.build_request(&ChatPrompt::new("s", "u"), 200)).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_model_availability_matches_tagged_names() {
        let names = vec!["llama3.1:latest".to_string(), "mistral:7b".to_string()];
        assert!(model_availability("llama3.1", &names).available);
    }

    #[test]
    fn test_missing_model_message_has_remediation() {
        let names = vec!["mistral:7b".to_string()];
        let outcome = model_availability("llama3.1", &names);

        assert!(!outcome.available);
        assert!(outcome.message.contains("llama3.1"));
        assert!(outcome.message.contains("ollama pull llama3.1"));
        assert!(outcome.message.contains("mistral:7b"));

        let outcome = model_availability("llama3.1", &[]);
        assert!(outcome.message.contains("Available models: none"));
    }

    #[test]
    fn test_extract_content() {
        let body = json!({"message": {"role": "assistant", "content": "# Report"}, "done": true});
        assert_eq!(extract_content(&body).unwrap(), "# Report");

        let err = extract_content(&json!({"done": true})).unwrap_err();
        assert!(err.to_string().contains("Invalid response structure from Ollama API"));
    }

    #[tokio::test]
    async fn test_probe_reports_connection_failure() {
        // Nothing listens on the discard port
        let adapter = OllamaAdapter::new("http://127.0.0.1:9/api/chat", "llama3.1").unwrap();
        let outcome = adapter.probe().await;
        assert!(!outcome.available);
        assert!(outcome.message.contains("ollama serve"));
    }
}
