//! Repository and release snapshots.
//!
//! These are the durable records kept per watched repository. Field names are
//! serialized in camelCase so the persisted file reads like the GraphQL payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReleaseError, Result};

/// Opaque, stable GitHub node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Validate an untyped identifier coming off the wire.
    ///
    /// GitHub declares `ID` as a scalar, so anything other than a non-empty
    /// JSON string is rejected.
    pub fn from_value(field: &'static str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Ok(Self(s.clone())),
            other => Err(ReleaseError::MalformedIdentifier {
                field,
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A watched repository together with its most recently observed release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub id: NodeId,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub url: String,
    pub release: ReleaseSnapshot,
}

impl RepositorySnapshot {
    /// `owner/name` of the repository.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A single release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSnapshot {
    pub id: NodeId,
    /// Version label, e.g. `v1.2.3`.
    pub name: String,
    pub description: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

/// Publish time recorded for a draft release.
///
/// Any real publish time is later, so publishing a draft that was recorded
/// as a baseline counts as a new release.
pub const UNPUBLISHED_AT: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

impl ReleaseSnapshot {
    pub fn is_published(&self) -> bool {
        self.published_at > UNPUBLISHED_AT
    }

    /// Strictly-later publish time. Equal timestamps are not newer.
    pub fn is_newer_than(&self, other: &ReleaseSnapshot) -> bool {
        self.published_at > other.published_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn release(name: &str, day: u32) -> ReleaseSnapshot {
        ReleaseSnapshot {
            id: NodeId::new(format!("RE_{name}")),
            name: name.to_string(),
            description: String::new(),
            url: format!("https://github.com/acme/widget/releases/tag/{name}"),
            published_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_is_newer_than_is_strict() {
        let first = release("v1.0.0", 1);
        let same_time = release("v1.0.1", 1);
        let later = release("v1.1.0", 2);

        assert!(later.is_newer_than(&first));
        assert!(!first.is_newer_than(&later));
        assert!(!same_time.is_newer_than(&first));
    }

    #[test]
    fn test_draft_is_older_than_any_published_release() {
        let mut draft = release("v2.0.0", 1);
        draft.published_at = UNPUBLISHED_AT;

        assert!(!draft.is_published());
        assert!(release("v2.0.0", 1).is_published());
        assert!(release("v2.0.0", 1).is_newer_than(&draft));
        assert!(!draft.is_newer_than(&draft.clone()));
    }

    #[test]
    fn test_node_id_from_value() {
        let id = NodeId::from_value("repository.id", &json!("R_kgDOabc")).unwrap();
        assert_eq!(id.as_str(), "R_kgDOabc");

        for bad in [json!(42), json!(null), json!(""), json!({"id": "x"})] {
            let err = NodeId::from_value("repository.id", &bad).unwrap_err();
            assert!(matches!(
                err,
                ReleaseError::MalformedIdentifier {
                    field: "repository.id",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = RepositorySnapshot {
            id: NodeId::new("R_1"),
            name: "widget".to_string(),
            owner: "acme".to_string(),
            description: "Widgets".to_string(),
            url: "https://github.com/acme/widget".to_string(),
            release: release("v1.0.0", 1),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["id"], "R_1");
        assert_eq!(value["release"]["publishedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(snapshot.full_name(), "acme/widget");
    }
}
