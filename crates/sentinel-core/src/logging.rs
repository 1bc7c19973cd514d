//! Logging infrastructure
//!
//! Every process writes to a daily-rotated `sentinel.log` through a
//! non-blocking `tracing-appender` writer; the daemon and `--verbose` runs
//! mirror the same events to stdout. `RUST_LOG` replaces the built-in filter.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "sentinel.log";

/// Crate targets covered by the built-in filter
const LOG_TARGETS: &[&str] = &["sentinel_core", "sentinel_adapters", "sentinel_cli"];

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create log directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed
    #[error("Failed to install logger: {0}")]
    InitializationFailed(String),
}

/// Verbosity of the built-in filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!(
                "Unknown log level '{}' (expected error, warn, info, debug or trace)",
                other
            )),
        }
    }
}

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    log_dir: PathBuf,
    level: LogLevel,
    log_to_stdout: bool,
}

impl LoggerConfig {
    /// File logging into `log_dir` at info level
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            level: LogLevel::default(),
            log_to_stdout: false,
        }
    }

    /// `~/.sentinel/logs`
    pub fn with_default_dir() -> Self {
        Self::new(
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".sentinel")
                .join("logs"),
        )
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Mirrors events to stdout as well as the log file
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.log_to_stdout = enabled;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log_to_stdout(&self) -> bool {
        self.log_to_stdout
    }

    /// Filter used when `RUST_LOG` is unset, e.g. `sentinel_core=info,...`
    pub fn default_directive(&self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Base name of the rotated files; the appender adds a date suffix
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(DEFAULT_LOG_FILE)
    }
}

/// Flushes buffered log lines when dropped; keep it alive for the whole run
pub struct LoggerGuard {
    _worker: WorkerGuard,
}

/// Installs the global subscriber
///
/// # Errors
/// Fails if the log directory cannot be created or a subscriber is already set
pub fn init_logger(config: LoggerConfig) -> Result<LoggerGuard, LoggerError> {
    fs::create_dir_all(&config.log_dir).map_err(|source| LoggerError::DirectoryCreationFailed {
        path: config.log_dir.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::daily(&config.log_dir, DEFAULT_LOG_FILE);
    let (file_writer, worker) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let file_layer = layer_fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // A `None` layer is a no-op
    let stdout_layer = config
        .log_to_stdout
        .then(|| layer_fmt::layer().with_writer(std::io::stdout).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| LoggerError::InitializationFailed(e.to_string()))?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        level = %config.level,
        stdout = config.log_to_stdout,
        "Logger initialized"
    );

    Ok(LoggerGuard { _worker: worker })
}
