//! Subscription list
//!
//! The tracked repositories, stored as a JSON array of names.

use crate::ports::activity::RepositoryRef;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Failed to access subscriptions file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid subscriptions file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed list of subscribed repositories
#[derive(Debug, Clone)]
pub struct SubscriptionStore {
    path: PathBuf,
}

impl SubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribed repositories in insertion order; empty if the file does not exist
    pub fn list(&self) -> Result<Vec<RepositoryRef>, SubscriptionError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| SubscriptionError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| SubscriptionError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Adds `repo`
    ///
    /// # Returns
    /// `false` if it was already subscribed
    pub fn add(&self, repo: &RepositoryRef) -> Result<bool, SubscriptionError> {
        let mut repos = self.list()?;
        if repos.contains(repo) {
            return Ok(false);
        }
        repos.push(repo.clone());
        self.save(&repos)?;
        tracing::info!(repo = %repo, "Added subscription");
        Ok(true)
    }

    /// Removes `repo`
    ///
    /// # Returns
    /// `false` if it was not subscribed
    pub fn remove(&self, repo: &RepositoryRef) -> Result<bool, SubscriptionError> {
        let mut repos = self.list()?;
        let before = repos.len();
        repos.retain(|r| r != repo);
        if repos.len() == before {
            return Ok(false);
        }
        self.save(&repos)?;
        tracing::info!(repo = %repo, "Removed subscription");
        Ok(true)
    }

    fn save(&self, repos: &[RepositoryRef]) -> Result<(), SubscriptionError> {
        let io_err = |source| SubscriptionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(repos).map_err(|source| SubscriptionError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }
}
