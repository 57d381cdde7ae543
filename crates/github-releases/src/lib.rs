//! Latest-release lookup for GitHub repositories.
//!
//! The [`GithubClient`] queries the GitHub GraphQL API for the most recently
//! created release of a repository and translates the response into a
//! [`RepositorySnapshot`].

pub mod client;
pub mod error;
pub mod model;
pub mod response;

pub use client::{DEFAULT_ENDPOINT, GithubClient, QUERY_TIMEOUT, install_rustls_provider};
pub use error::{ReleaseError, Result};
pub use model::{NodeId, ReleaseSnapshot, RepositorySnapshot, UNPUBLISHED_AT};
