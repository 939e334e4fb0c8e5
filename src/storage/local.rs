//! Local filesystem state storage.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the previous state intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::StateMap;
use crate::storage::StateStore;

/// JSON file state backend.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> StateMap {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No state file at {}; starting fresh", self.location());
                return StateMap::new();
            }
            Err(e) => {
                log::warn!(
                    "Cannot read state file {}: {}. Starting fresh.",
                    self.location(),
                    e
                );
                return StateMap::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                log::warn!(
                    "State file {} is corrupt: {}. Starting fresh.",
                    self.location(),
                    e
                );
                StateMap::new()
            }
        }
    }

    async fn save(&self, state: &StateMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::state_write(self.location(), e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
