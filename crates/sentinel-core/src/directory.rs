//! Directory management
//!
//! Creates the data directory tree: logs, export cache, AI reports and prompts.

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::StorageConfig;
use crate::error::ConfigError;

/// Directory permission mode (owner read/write/execute only)
#[cfg(unix)]
const DIR_PERMISSION_MODE: u32 = 0o700;

/// Manages the data directory structure
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    data_dir: PathBuf,
    logs_dir: PathBuf,
    export_cache_dir: PathBuf,
    ai_reports_dir: PathBuf,
    prompts_dir: PathBuf,
}

impl DirectoryManager {
    /// Creates a DirectoryManager for the layout described by `storage`
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            data_dir: storage.data_dir.clone(),
            logs_dir: storage.logs_dir(),
            export_cache_dir: storage.export_cache_dir(),
            ai_reports_dir: storage.ai_reports_dir(),
            prompts_dir: storage.prompts_dir(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn export_cache_dir(&self) -> &Path {
        &self.export_cache_dir
    }

    pub fn ai_reports_dir(&self) -> &Path {
        &self.ai_reports_dir
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    fn all_dirs(&self) -> [&Path; 5] {
        [
            &self.data_dir,
            &self.logs_dir,
            &self.export_cache_dir,
            &self.ai_reports_dir,
            &self.prompts_dir,
        ]
    }

    /// Initializes the directory structure
    ///
    /// Creates every directory of the layout with 700 permissions on Unix.
    /// Existing directories are kept as they are apart from their permissions.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if directory creation fails
    pub fn initialize(&self) -> Result<(), ConfigError> {
        for dir in self.all_dirs() {
            create_directory_with_permissions(dir)?;
        }

        tracing::info!("Initialized data directory at {:?}", self.data_dir);
        Ok(())
    }

    /// Checks if the directory structure is properly initialized
    pub fn is_initialized(&self) -> bool {
        self.all_dirs().iter().all(|dir| dir.is_dir())
    }
}

fn create_directory_with_permissions(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        tracing::debug!("Created directory: {:?}", path);
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(DIR_PERMISSION_MODE))?;

    Ok(())
}
