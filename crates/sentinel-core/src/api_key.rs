//! Credentials and LLM provider resolution
//!
//! Credentials are read from the environment once, at process start, into an
//! explicit [`Credentials`] value. Provider resolution turns configuration plus
//! credentials into exactly one [`ProviderConfig`].

use crate::config::{LlmConfig, ProviderChoice};
use crate::error::ConfigError;
use std::env;
use std::fmt;

/// Environment variable name for the GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable name for the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable name for the DeepSeek API key
pub const DEEPSEEK_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// A wrapper for API keys that prevents accidental logging
///
/// The `Debug` and `Display` implementations mask the actual key value
/// to prevent sensitive data from appearing in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretApiKey {
    key: String,
}

impl SecretApiKey {
    /// Creates a new SecretApiKey from a string
    ///
    /// # Returns
    /// * `Some(SecretApiKey)` if the key is non-empty
    /// * `None` if the key is empty or whitespace-only
    pub fn new(key: String) -> Option<Self> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                key: trimmed.to_string(),
            })
        }
    }

    /// Returns the actual API key value
    ///
    /// Use this only when actually making API calls.
    /// Never log the returned value.
    pub fn expose(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for SecretApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretApiKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecretApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED API KEY]")
    }
}

/// LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// DeepSeek (OpenAI-compatible chat completions)
    DeepSeek,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    /// Short lowercase identifier, also used for prompt override directories
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Returns the environment variable holding this provider's API key
    ///
    /// The local provider needs none.
    pub fn env_var_name(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some(OPENAI_API_KEY_ENV),
            ProviderKind::DeepSeek => Some(DEEPSEEK_API_KEY_ENV),
            ProviderKind::Ollama => None,
        }
    }

    /// Returns a human-readable name for the provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

/// Secrets available to this process
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<SecretApiKey>,
    pub openai_api_key: Option<SecretApiKey>,
    pub deepseek_api_key: Option<SecretApiKey>,
}

impl Credentials {
    /// Reads every credential from the environment
    ///
    /// Call once at startup and pass the result down.
    pub fn from_env() -> Self {
        Self {
            github_token: read_env_key(GITHUB_TOKEN_ENV),
            openai_api_key: read_env_key(OPENAI_API_KEY_ENV),
            deepseek_api_key: read_env_key(DEEPSEEK_API_KEY_ENV),
        }
    }

    /// The API key for `kind`, if the provider uses one and it is set
    pub fn api_key_for(&self, kind: ProviderKind) -> Option<&SecretApiKey> {
        match kind {
            ProviderKind::OpenAi => self.openai_api_key.as_ref(),
            ProviderKind::DeepSeek => self.deepseek_api_key.as_ref(),
            ProviderKind::Ollama => None,
        }
    }
}

fn read_env_key(name: &str) -> Option<SecretApiKey> {
    env::var(name).ok().and_then(SecretApiKey::new)
}

/// The one active LLM backend with everything needed to talk to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    OpenAi { api_key: SecretApiKey, model: String },
    DeepSeek { api_key: SecretApiKey, model: String },
    Ollama { api_url: String, model: String },
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::OpenAi { .. } => ProviderKind::OpenAi,
            ProviderConfig::DeepSeek { .. } => ProviderKind::DeepSeek,
            ProviderConfig::Ollama { .. } => ProviderKind::Ollama,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAi { model, .. }
            | ProviderConfig::DeepSeek { model, .. }
            | ProviderConfig::Ollama { model, .. } => model,
        }
    }
}

/// Picks the backend for `provider = "auto"`
///
/// DeepSeek when its key is present, else OpenAI when its key is present,
/// else the local Ollama server.
pub fn auto_select(credentials: &Credentials) -> ProviderKind {
    if credentials.deepseek_api_key.is_some() {
        ProviderKind::DeepSeek
    } else if credentials.openai_api_key.is_some() {
        ProviderKind::OpenAi
    } else {
        ProviderKind::Ollama
    }
}

/// Resolves the active provider from configuration and credentials
///
/// An explicit provider always wins over auto-selection. Only the selected
/// provider's credential is checked.
///
/// # Errors
/// Returns `ConfigError::MissingCredential` when the selected cloud provider has no key
pub fn resolve_provider(
    llm: &LlmConfig,
    credentials: &Credentials,
) -> Result<ProviderConfig, ConfigError> {
    let kind = match llm.provider {
        ProviderChoice::Auto => auto_select(credentials),
        ProviderChoice::OpenAi => ProviderKind::OpenAi,
        ProviderChoice::DeepSeek => ProviderKind::DeepSeek,
        ProviderChoice::Ollama => ProviderKind::Ollama,
    };

    let missing = || ConfigError::MissingCredential {
        provider: kind.display_name().to_string(),
        env_var: kind.env_var_name().unwrap_or_default().to_string(),
    };

    let config = match kind {
        ProviderKind::OpenAi => ProviderConfig::OpenAi {
            api_key: credentials.openai_api_key.clone().ok_or_else(missing)?,
            model: llm.openai_model.clone(),
        },
        ProviderKind::DeepSeek => ProviderConfig::DeepSeek {
            api_key: credentials.deepseek_api_key.clone().ok_or_else(missing)?,
            model: llm.deepseek_model.clone(),
        },
        ProviderKind::Ollama => ProviderConfig::Ollama {
            api_url: llm.ollama_api_url.clone(),
            model: llm.ollama_model.clone(),
        },
    };

    tracing::info!(provider = %kind, model = %config.model(), "Resolved LLM provider");
    Ok(config)
}

/// Remediation text for an unavailable provider
///
/// # Arguments
/// * `kind` - The provider that failed its probe
/// * `details` - The probe failure detail
pub fn provider_guidance(kind: ProviderKind, details: &str) -> String {
    match kind {
        ProviderKind::Ollama => format!(
            r#"Ollama is not available: {details}

To set up Ollama:
1. Install Ollama: https://ollama.com/download
2. Pull a model: ollama pull <model>
3. Start the server: ollama serve
4. Verify it responds: curl http://localhost:11434/api/tags"#
        ),
        ProviderKind::DeepSeek => format!(
            r#"DeepSeek is not available: {details}

To set up DeepSeek:
1. Create an API key at https://platform.deepseek.com
2. Export it: export {DEEPSEEK_API_KEY_ENV}=your-api-key-here"#
        ),
        ProviderKind::OpenAi => format!(
            r#"OpenAI is not available: {details}

To set up OpenAI:
1. Create an API key at https://platform.openai.com
2. Export it: export {OPENAI_API_KEY_ENV}=your-api-key-here
3. Check that your account has remaining credits"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> Option<SecretApiKey> {
        SecretApiKey::new(value.to_string())
    }

    // === SecretApiKey Tests ===

    #[test]
    fn test_secret_api_key_new_empty() {
        assert!(SecretApiKey::new("".to_string()).is_none());
        assert!(SecretApiKey::new("   \t\n  ".to_string()).is_none());
    }

    #[test]
    fn test_secret_api_key_trims_whitespace() {
        let key = SecretApiKey::new("  sk-test-key  ".to_string()).unwrap();
        assert_eq!(key.expose(), "sk-test-key");
    }

    #[test]
    fn test_secret_api_key_debug_redacted() {
        let key = SecretApiKey::new("super-secret-key".to_string()).unwrap();
        let debug_str = format!("{:?}", key);
        assert!(!debug_str.contains("super-secret-key"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!key.to_string().contains("super-secret-key"));
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let creds = Credentials {
            openai_api_key: key("sk-live"),
            ..Default::default()
        };
        assert!(!format!("{:?}", creds).contains("sk-live"));
    }

    // === ProviderKind Tests ===

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("deepseek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_env_var() {
        assert_eq!(ProviderKind::OpenAi.env_var_name(), Some("OPENAI_API_KEY"));
        assert_eq!(ProviderKind::DeepSeek.env_var_name(), Some("DEEPSEEK_API_KEY"));
        assert_eq!(ProviderKind::Ollama.env_var_name(), None);
    }

    // === Auto-selection Tests ===

    #[test]
    fn test_auto_prefers_deepseek() {
        let creds = Credentials {
            openai_api_key: key("sk-openai"),
            deepseek_api_key: key("sk-deepseek"),
            ..Default::default()
        };
        assert_eq!(auto_select(&creds), ProviderKind::DeepSeek);
    }

    #[test]
    fn test_auto_falls_back_to_openai_then_ollama() {
        let creds = Credentials {
            openai_api_key: key("sk-openai"),
            ..Default::default()
        };
        assert_eq!(auto_select(&creds), ProviderKind::OpenAi);
        assert_eq!(auto_select(&Credentials::default()), ProviderKind::Ollama);
    }

    // === resolve_provider Tests ===

    #[test]
    fn test_explicit_provider_wins_over_auto() {
        let llm = LlmConfig {
            provider: ProviderChoice::Ollama,
            ..Default::default()
        };
        let creds = Credentials {
            deepseek_api_key: key("sk-deepseek"),
            ..Default::default()
        };
        let config = resolve_provider(&llm, &creds).unwrap();
        assert_eq!(config.kind(), ProviderKind::Ollama);
        assert_eq!(config.model(), "llama3.1");
    }

    #[test]
    fn test_selected_provider_without_key_fails_fast() {
        let llm = LlmConfig {
            provider: ProviderChoice::OpenAi,
            ..Default::default()
        };
        let creds = Credentials {
            deepseek_api_key: key("sk-deepseek"),
            ..Default::default()
        };
        let err = resolve_provider(&llm, &creds).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_unselected_missing_keys_are_irrelevant() {
        let llm = LlmConfig {
            provider: ProviderChoice::DeepSeek,
            ..Default::default()
        };
        let creds = Credentials {
            deepseek_api_key: key("sk-deepseek"),
            ..Default::default()
        };
        let config = resolve_provider(&llm, &creds).unwrap();
        assert_eq!(
            config,
            ProviderConfig::DeepSeek {
                api_key: SecretApiKey::new("sk-deepseek".to_string()).unwrap(),
                model: "deepseek-chat".to_string(),
            }
        );
    }

    #[test]
    fn test_auto_without_keys_resolves_ollama() {
        let config = resolve_provider(&LlmConfig::default(), &Credentials::default()).unwrap();
        assert_eq!(
            config,
            ProviderConfig::Ollama {
                api_url: "http://localhost:11434/api/chat".to_string(),
                model: "llama3.1".to_string(),
            }
        );
    }

    // === Guidance Tests ===

    #[test]
    fn test_provider_guidance_contents() {
        let ollama = provider_guidance(ProviderKind::Ollama, "Connection failed");
        assert!(ollama.contains("ollama pull"));
        assert!(ollama.contains("ollama serve"));
        assert!(ollama.contains("Connection failed"));

        let deepseek = provider_guidance(ProviderKind::DeepSeek, "401");
        assert!(deepseek.contains("DEEPSEEK_API_KEY"));
        assert!(deepseek.contains("https://platform.deepseek.com"));

        let openai = provider_guidance(ProviderKind::OpenAi, "401");
        assert!(openai.contains("OPENAI_API_KEY"));
        assert!(openai.contains("credits"));
    }
}
