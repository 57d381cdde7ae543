//! Domain types.
//!
//! Snapshots come from the release source crate; this module adds the
//! watch-list identity used for lookups and persistence.

mod watch_key;

pub use github_releases::{NodeId, ReleaseSnapshot, RepositorySnapshot};
pub use watch_key::{WatchKey, parse_watch_list};
