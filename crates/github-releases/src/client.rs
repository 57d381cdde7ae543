use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::{ReleaseError, Result};
use crate::model::RepositorySnapshot;
use crate::response::{GraphqlResponse, LATEST_RELEASE_QUERY, translate_response};

/// Public GitHub GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Upper bound for a single latest-release query, including the body read.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("release-watch/", env!("CARGO_PKG_VERSION"));

/// Install the process-wide rustls crypto provider once.
///
/// Every `reqwest::Client` built in this workspace needs it.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// GraphQL client for latest-release lookups.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GithubClient {
    /// Create a client against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(token, DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom GraphQL endpoint (GitHub Enterprise).
    pub fn with_endpoint(token: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        install_rustls_provider();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(QUERY_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the most recently created release of `owner/name`.
    ///
    /// Fails with [`ReleaseError::QueryTimeout`] once [`QUERY_TIMEOUT`] elapses.
    pub async fn latest_release(&self, owner: &str, name: &str) -> Result<RepositorySnapshot> {
        match tokio::time::timeout(QUERY_TIMEOUT, self.query(owner, name)).await {
            Ok(result) => result,
            Err(_) => Err(ReleaseError::QueryTimeout(QUERY_TIMEOUT)),
        }
    }

    async fn query(&self, owner: &str, name: &str) -> Result<RepositorySnapshot> {
        let body = json!({
            "query": LATEST_RELEASE_QUERY,
            "variables": {
                "owner": owner,
                "name": name,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReleaseError::HttpStatus { status, body });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        debug!(owner, name, bytes = body.len(), "GraphQL response received");

        let parsed: GraphqlResponse = serde_json::from_str(&body)?;
        translate_response(owner, name, parsed)
    }
}

fn map_transport_error(e: reqwest::Error) -> ReleaseError {
    if e.is_timeout() {
        ReleaseError::QueryTimeout(QUERY_TIMEOUT)
    } else {
        ReleaseError::Transport(e)
    }
}
