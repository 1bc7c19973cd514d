//! Application startup and shutdown
//!
//! Loads configuration, prepares the data directory, installs logging and a
//! panic hook, and hands commands an [`AppContext`].

use anyhow::{Context, Result};
use sentinel_core::{
    init_logger, load_config, load_config_from_path, Config, Credentials, DirectoryManager,
    LogLevel, LoggerConfig, LoggerGuard, SubscriptionStore,
};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a command needs after startup
pub struct AppContext {
    pub config: Arc<Config>,
    /// API credentials read from the environment
    pub credentials: Credentials,
    #[allow(dead_code)]
    logger_guard: Option<LoggerGuard>,
}

impl AppContext {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn subscriptions(&self) -> SubscriptionStore {
        SubscriptionStore::new(self.config.storage.subscriptions_file())
    }
}

/// Startup switches
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub init_logger: bool,
    pub create_directories: bool,
    /// Defaults to info
    pub log_level: Option<LogLevel>,
    pub log_to_stdout: bool,
}

impl InitOptions {
    /// Long-running daemon: logs go to the file and stdout
    pub fn daemon() -> Self {
        Self {
            init_logger: true,
            create_directories: true,
            log_level: Some(LogLevel::Info),
            log_to_stdout: true,
        }
    }

    /// One-shot command: stdout is kept for command output
    pub fn command() -> Self {
        Self {
            init_logger: true,
            create_directories: true,
            log_level: None,
            log_to_stdout: false,
        }
    }

    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.log_to_stdout = enabled;
        self
    }

    pub fn with_log_level(mut self, level: Option<LogLevel>) -> Self {
        if level.is_some() {
            self.log_level = level;
        }
        self
    }
}

/// Starts the application
///
/// Reads `config_path` (or `~/.sentinel/config.toml`), creates the data
/// directory tree, then installs logging and the panic hook.
///
/// # Errors
/// A configuration that fails to parse or validate is fatal.
pub fn initialize(options: InitOptions, config_path: Option<&Path>) -> Result<AppContext> {
    let config = match config_path {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    if options.create_directories {
        DirectoryManager::new(&config.storage)
            .initialize()
            .context("Failed to create data directories")?;
    }

    let logs_dir = config.storage.logs_dir();
    let logger_guard = if options.init_logger {
        let logger_config = LoggerConfig::new(logs_dir.clone())
            .with_level(options.log_level.unwrap_or_default())
            .with_stdout(options.log_to_stdout);
        Some(init_logger(logger_config).context("Failed to initialize logger")?)
    } else {
        None
    };

    install_panic_hook(logs_dir);

    Ok(AppContext {
        config: Arc::new(config),
        credentials: Credentials::from_env(),
        logger_guard,
    })
}

/// Logs panics before the default hook prints them
fn install_panic_hook(logs_dir: PathBuf) {
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown location".to_string());
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        error!(location = %location, "FATAL: {}", message);
        eprintln!();
        eprintln!("sentinel crashed at {}: {}", location, message);
        eprintln!("Logs: {}", logs_dir.display());
        eprintln!();

        previous(panic_info);
    }));
}

/// Logs the shutdown reason and returns the matching exit code
///
/// # Returns
/// 0, or 1 when `reason` mentions an error
pub fn graceful_shutdown(reason: &str) -> i32 {
    info!(reason, "Shutting down");

    if reason.contains("error") || reason.contains("fatal") {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_daemon_mirrors_logs_to_stdout() {
        let options = InitOptions::daemon();
        assert!(options.init_logger);
        assert!(options.log_to_stdout);
        assert_eq!(options.log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_command_options() {
        let options = InitOptions::command();
        assert!(options.create_directories);
        assert!(!options.log_to_stdout);
        assert!(options.log_level.is_none());

        let verbose = InitOptions::command()
            .with_stdout(true)
            .with_log_level(Some(LogLevel::Debug));
        assert!(verbose.log_to_stdout);
        assert_eq!(verbose.log_level, Some(LogLevel::Debug));

        let unchanged = InitOptions::daemon().with_log_level(None);
        assert_eq!(unchanged.log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_initialize_creates_layout_from_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!("[storage]\ndata_dir = \"{}\"\n", data_dir.display()),
        )
        .unwrap();

        let options = InitOptions {
            init_logger: false,
            ..InitOptions::command()
        };
        let ctx = initialize(options, Some(&config_path)).unwrap();

        assert_eq!(ctx.config().storage.data_dir, data_dir);
        assert!(data_dir.join("reports").join("exports").is_dir());
        assert!(ctx.subscriptions().list().unwrap().is_empty());
    }

    #[test]
    fn test_initialize_rejects_unknown_provider() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[llm]\nprovider = \"claude\"\n").unwrap();

        let options = InitOptions {
            init_logger: false,
            create_directories: false,
            ..InitOptions::default()
        };
        assert!(initialize(options, Some(&config_path)).is_err());
    }

    #[test]
    fn test_graceful_shutdown_exit_codes() {
        assert_eq!(graceful_shutdown("daemon stopped"), 0);
        assert_eq!(graceful_shutdown("fatal error: scheduler failed"), 1);
    }
}
