//! Notifier port definition

use async_trait::async_trait;

use crate::ports::activity::RepositoryRef;

/// Port for delivering a rendered report to its audience
///
/// Delivery failures are the adapter's to log; callers never see them.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn notify(&self, report: &str, repo: &RepositoryRef);
}
