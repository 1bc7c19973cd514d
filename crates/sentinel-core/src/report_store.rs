//! AI report store
//!
//! Mirrors the export cache layout: the report for `<repo>/<stem>.md` lives at
//! `<root>/<repo>/<stem>_report.md`.

use crate::cache::artifact_stem;
use crate::error::StorageError;
use crate::ports::activity::{DateSpan, RepositoryRef};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AiReportStore {
    root: PathBuf,
}

impl AiReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the report for `(repo, span)`; does not touch the filesystem
    pub fn path_for(&self, repo: &RepositoryRef, span: &DateSpan) -> PathBuf {
        self.root
            .join(repo.cache_dir_name())
            .join(format!("{}_report.md", artifact_stem(span)))
    }

    /// Writes `report` for `(repo, span)`, replacing any earlier report
    pub fn write(
        &self,
        repo: &RepositoryRef,
        span: &DateSpan,
        report: &str,
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(repo, span);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        fs::write(&path, report).map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(repo = %repo, path = %path.display(), "Wrote AI report");
        Ok(path)
    }

    pub fn read(&self, repo: &RepositoryRef, span: &DateSpan) -> Result<String, StorageError> {
        let path = self.path_for(repo, span);
        if !path.is_file() {
            return Err(StorageError::NotFound(path));
        }
        fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme/my-widgets").unwrap()
    }

    #[test]
    fn test_report_path_mirrors_cache_key() {
        let store = AiReportStore::new("/reports");
        let span = DateSpan::single(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            store.path_for(&repo(), &span),
            PathBuf::from("/reports/acme_my_widgets/2024-03-01_report.md")
        );

        let week = DateSpan::ending_on(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(), 7).unwrap();
        assert!(store
            .path_for(&repo(), &week)
            .ends_with("acme_my_widgets/2024-03-07_7days_report.md"));
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = AiReportStore::new(temp_dir.path());
        let span = DateSpan::single(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        store.write(&repo(), &span, "first").unwrap();
        let path = store.write(&repo(), &span, "second").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second");
        assert_eq!(store.read(&repo(), &span).unwrap(), "second");
    }
}
