//! LLM provider adapter implementations
//!
//! OpenAI and DeepSeek share the chat completions adapter; Ollama has its own.

mod chat_completions;
mod ollama;

pub use chat_completions::{ChatCompletionsAdapter, DEEPSEEK_API_BASE, OPENAI_API_BASE};
pub use ollama::{OllamaAdapter, DEFAULT_OLLAMA_API_URL};

use sentinel_core::api_key::ProviderConfig;
use sentinel_core::ports::ai::{AIError, LlmProviderPort};
use std::sync::Arc;

/// Builds the adapter for a resolved provider configuration
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProviderPort>, AIError> {
    let provider: Arc<dyn LlmProviderPort> = match config {
        ProviderConfig::OpenAi { api_key, model } => {
            Arc::new(ChatCompletionsAdapter::openai(api_key.clone(), model.clone())?)
        }
        ProviderConfig::DeepSeek { api_key, model } => {
            Arc::new(ChatCompletionsAdapter::deepseek(api_key.clone(), model.clone())?)
        }
        ProviderConfig::Ollama { api_url, model } => {
            Arc::new(OllamaAdapter::new(api_url.clone(), model.clone())?)
        }
    };
    tracing::info!(provider = %provider.kind(), model = %provider.model(), "LLM provider ready");
    Ok(provider)
}
