use std::path::{Path, PathBuf};

use crate::error::ProviderError;
use crate::state::ProviderState;

/// State persisted as one JSON file on local disk.
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

    /// Write state atomically: tmp file, then rename over the old one.
    pub fn flush(&self, state: &ProviderState) -> Result<(), ProviderError> {
        let json = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            resources = state.resources.len(),
            "state flushed to local disk"
        );
        Ok(())
    }

    /// Load state, or a fresh one when no file exists yet.
    pub fn load(&self) -> Result<ProviderState, ProviderError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no existing state found, starting fresh");
            return Ok(ProviderState::default());
        }

        let json = std::fs::read(&self.path)?;
        let state: ProviderState = serde_json::from_slice(&json)?;
        if state.version > ProviderState::VERSION {
            return Err(ProviderError::State(format!(
                "state file version {} is newer than supported version {}",
                state.version,
                ProviderState::VERSION
            )));
        }
        tracing::debug!(path = %self.path.display(), "state loaded from local disk");
        Ok(state)
    }
}
