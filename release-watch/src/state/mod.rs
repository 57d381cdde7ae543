//! Durable last-known-release state.
//!
//! The whole map is written as pretty-printed JSON on every save. A missing
//! file is an empty state; saves are not atomic and the last completed save
//! wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::RepositorySnapshot;
use crate::utils::fs;
use crate::{Error, Result};

/// Persisted state keyed by `owner/name`.
pub type PersistedState = BTreeMap<String, RepositorySnapshot>;

/// JSON file backed state store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file. A missing file yields an empty state.
    pub async fn load(&self) -> Result<PersistedState> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Releases file does not exist yet");
                return Ok(PersistedState::new());
            }
            Err(e) => return Err(fs::io_error("reading releases file", &self.path, e)),
        };

        let state: PersistedState =
            serde_json::from_slice(&data).map_err(|e| Error::corrupt_state(&self.path, e))?;
        debug!(path = %self.path.display(), repositories = state.len(), "Loaded releases");
        Ok(state)
    }

    /// Overwrite the state file with the full current state.
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(state)?;
        data.push(b'\n');

        fs::ensure_parent_dir_with_op("creating releases directory", &self.path).await?;
        tokio::fs::write(&self.path, data)
            .await
            .map_err(|e| fs::io_error("writing releases file", &self.path, e))
    }
}
