use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReleaseError>;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("can't find any releases for {owner}/{name}")]
    NoReleaseFound { owner: String, name: String },
    #[error("repository {owner}/{name} not found")]
    RepositoryNotFound { owner: String, name: String },
    #[error("can't convert {field} to a string identifier: {value}")]
    MalformedIdentifier { field: &'static str, value: String },
    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("graphql error: {0}")]
    Graphql(String),
}

impl ReleaseError {
    pub fn no_release_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NoReleaseFound {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn repository_not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::RepositoryNotFound {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Whether a later query may succeed without any configuration change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::QueryTimeout(_) | Self::Transport(_) | Self::HttpStatus { .. }
        )
    }
}
