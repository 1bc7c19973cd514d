//! Common error types for GitHub Sentinel
//!
//! Domain-specific errors live next to the code that raises them and are
//! re-exported here. `SentinelError` aggregates them for callers that only
//! need to propagate.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::logging::LoggerError;
pub use crate::orchestrator::ReportError;
pub use crate::ports::activity::{DateSpanError, FetchError};
pub use crate::ports::ai::AIError;
pub use crate::scheduler::SchedulerError;
pub use crate::subscription::SubscriptionError;

/// Top-level error type for GitHub Sentinel operations
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cache or report storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Activity fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// LLM provider errors
    #[error("AI error: {0}")]
    AI(#[from] AIError),

    /// Report pipeline errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Subscription list errors
    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Logger errors
    #[error("Logger error: {0}")]
    Logger(#[from] LoggerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Not valid TOML, or an unknown enum value
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The selected provider has no credential
    #[error("{provider} is selected but {env_var} is not set")]
    MissingCredential { provider: String, env_var: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem errors of the export cache and report stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing an artifact failed
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact expected on disk but absent
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
