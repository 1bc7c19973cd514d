//! Configuration management for GitHub Sentinel
//!
//! Handles loading and validation of TOML configuration files.

use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Filesystem layout
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Daemon schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Report generation switches
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Notification delivery
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Storage configuration
///
/// Relative paths in the optional fields are resolved against `data_dir`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base data directory (default: ~/.sentinel/)
    #[serde(default = "default_data_dir", deserialize_with = "deserialize_path")]
    pub data_dir: PathBuf,

    /// Export cache root (default: `<data_dir>/reports/exports`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_cache_dir: Option<PathBuf>,

    /// AI report root (default: `<data_dir>/reports/ai_reports`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reports_dir: Option<PathBuf>,

    /// Subscription list (default: `<data_dir>/subscriptions.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions_file: Option<PathBuf>,

    /// Prompt template directory (default: `<data_dir>/prompts`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_cache_dir: None,
            ai_reports_dir: None,
            subscriptions_file: None,
            prompts_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn export_cache_dir(&self) -> PathBuf {
        self.resolve(self.export_cache_dir.as_deref(), "reports/exports")
    }

    pub fn ai_reports_dir(&self) -> PathBuf {
        self.resolve(self.ai_reports_dir.as_deref(), "reports/ai_reports")
    }

    pub fn subscriptions_file(&self) -> PathBuf {
        self.resolve(self.subscriptions_file.as_deref(), "subscriptions.json")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.resolve(self.prompts_dir.as_deref(), "prompts")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    fn resolve(&self, configured: Option<&Path>, default_rel: &str) -> PathBuf {
        match configured {
            Some(path) => {
                let expanded = expand_tilde(path);
                if expanded.is_absolute() {
                    expanded
                } else {
                    self.data_dir.join(expanded)
                }
            }
            None => self.data_dir.join(default_rel),
        }
    }
}

/// Provider selection as written in the configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// DeepSeek, then OpenAI, then Ollama, by credential presence
    #[default]
    Auto,
    OpenAi,
    DeepSeek,
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    /// "auto", "openai", "deepseek" or "ollama"
    #[serde(default)]
    pub provider: ProviderChoice,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_deepseek_model")]
    pub deepseek_model: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Ollama chat endpoint
    #[serde(default = "default_ollama_api_url")]
    pub ollama_api_url: String,

    /// Token budget for report generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::default(),
            openai_model: default_openai_model(),
            deepseek_model: default_deepseek_model(),
            ollama_model: default_ollama_model(),
            ollama_api_url: default_ollama_api_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// GitHub API configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Issue and pull request state filter ("open", "closed" or "all")
    #[serde(default = "default_issue_state")]
    pub issue_state: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            issue_state: default_issue_state(),
        }
    }
}

/// Daemon schedule configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Days between runs; also the length of each fetched span
    #[serde(default = "default_frequency_days")]
    pub frequency_days: u32,

    /// Local time of day, "HH:MM"
    #[serde(default = "default_execution_time")]
    pub execution_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            frequency_days: default_frequency_days(),
            execution_time: default_execution_time(),
        }
    }
}

impl ScheduleConfig {
    /// Parses `execution_time`
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` unless the value is "HH:MM"
    pub fn execution_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.execution_time, "%H:%M").map_err(|_| {
            ConfigError::InvalidValue(format!(
                "execution_time must be HH:MM, got '{}'",
                self.execution_time
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportsConfig {
    /// Whether the report commands call the LLM at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Webhook receiving JSON notifications; unset disables delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sentinel")
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_ollama_api_url() -> String {
    "http://localhost:11434/api/chat".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_issue_state() -> String {
    "closed".to_string()
}

fn default_frequency_days() -> u32 {
    1
}

fn default_execution_time() -> String {
    "08:00".to_string()
}

fn default_true() -> bool {
    true
}

/// Expands tilde (~) in a path to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

/// Custom deserializer for paths that expands tilde
fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path_str = String::deserialize(deserializer)?;
    Ok(expand_tilde(Path::new(&path_str)))
}

impl Config {
    /// Validates the configuration values
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if:
    /// - `schedule.frequency_days` is 0
    /// - `schedule.execution_time` is not "HH:MM"
    /// - `llm.max_tokens` is 0
    /// - `github.issue_state` is not "open", "closed" or "all"
    /// - a model name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.frequency_days == 0 {
            return Err(ConfigError::InvalidValue(
                "frequency_days must be >= 1".to_string(),
            ));
        }

        self.schedule.execution_time()?;

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue(
                "max_tokens must be > 0".to_string(),
            ));
        }

        if !["open", "closed", "all"].contains(&self.github.issue_state.as_str()) {
            return Err(ConfigError::InvalidValue(
                "issue_state must be 'open', 'closed' or 'all'".to_string(),
            ));
        }

        for (name, model) in [
            ("openai_model", &self.llm.openai_model),
            ("deepseek_model", &self.llm.deepseek_model),
            ("ollama_model", &self.llm.ollama_model),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }
}

/// Returns the default configuration file path (`~/.sentinel/config.toml`)
pub fn get_default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Loads configuration from the specified path
///
/// If the file doesn't exist, creates a default configuration file.
///
/// # Errors
/// * `ConfigError::ParseError` - The file is not valid TOML or names an unknown provider
/// * `ConfigError::InvalidValue` - A value fails validation
/// * `ConfigError::Io` - The file could not be read or created
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = Config::default();
        let toml_str = toml::to_string_pretty(&default_config)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, &toml_str)?;

        tracing::info!("Created default configuration file at {:?}", path);
        return Ok(default_config);
    }

    let content = fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    config.validate()?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Loads configuration from the default path (`~/.sentinel/config.toml`)
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from_path(&get_default_config_path())
}
