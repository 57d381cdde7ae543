//! GraphQL wire models and their translation into snapshots.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ReleaseError, Result};
use crate::model::{NodeId, ReleaseSnapshot, RepositorySnapshot, UNPUBLISHED_AT};

/// Fetches the single most recently *created* release.
///
/// `last: 1` over an ascending `CREATED_AT` ordering; neither semver order
/// nor publish time is considered.
pub const LATEST_RELEASE_QUERY: &str = r#"query LatestRelease($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    name
    description
    url
    releases(last: 1, orderBy: {field: CREATED_AT, direction: ASC}) {
      edges {
        node {
          id
          name
          description
          url
          publishedAt
        }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    pub data: Option<QueryData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    #[serde(default)]
    pub id: Value,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub releases: ReleaseConnection,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseConnection {
    #[serde(default)]
    pub edges: Vec<ReleaseEdge>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseEdge {
    pub node: ReleaseNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    #[serde(default)]
    pub id: Value,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Translate a decoded response for `owner/name` into a snapshot.
pub fn translate_response(
    owner: &str,
    name: &str,
    response: GraphqlResponse,
) -> Result<RepositorySnapshot> {
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(ReleaseError::Graphql(messages.join("; ")));
    }

    let repository = response
        .data
        .and_then(|data| data.repository)
        .ok_or_else(|| ReleaseError::repository_not_found(owner, name))?;

    let repository_id = NodeId::from_value("repository.id", &repository.id)?;

    let Some(edge) = repository.releases.edges.into_iter().next_back() else {
        return Err(ReleaseError::no_release_found(owner, name));
    };
    let latest = edge.node;

    let release_id = NodeId::from_value("release.id", &latest.id)?;
    // Drafts have no publish time yet.
    let published_at = latest.published_at.unwrap_or(UNPUBLISHED_AT);

    Ok(RepositorySnapshot {
        id: repository_id,
        name: repository.name,
        owner: owner.to_string(),
        description: repository.description.unwrap_or_default(),
        url: repository.url,
        release: ReleaseSnapshot {
            id: release_id,
            name: latest.name.unwrap_or_default(),
            description: latest.description.unwrap_or_default(),
            url: latest.url,
            published_at,
        },
    })
}
