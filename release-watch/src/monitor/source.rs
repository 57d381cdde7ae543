use std::sync::Arc;

use async_trait::async_trait;
use github_releases::{GithubClient, ReleaseError};

use crate::domain::RepositorySnapshot;

/// Looks up the current latest release of a repository.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn fetch_latest_release(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<RepositorySnapshot, ReleaseError>;
}

#[async_trait]
impl<T: ReleaseSource + ?Sized> ReleaseSource for Arc<T> {
    async fn fetch_latest_release(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<RepositorySnapshot, ReleaseError> {
        (**self).fetch_latest_release(owner, name).await
    }
}

#[async_trait]
impl ReleaseSource for GithubClient {
    async fn fetch_latest_release(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<RepositorySnapshot, ReleaseError> {
        self.latest_release(owner, name).await
    }
}
