use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{DomainError, StateSnapshotReader};

/// Snapshot reader over a JSON file; a missing file means no snapshot
#[derive(Debug, Clone)]
pub struct FileSnapshotReader {
    path: PathBuf,
}

impl FileSnapshotReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StateSnapshotReader for FileSnapshotReader {
    async fn read_snapshot(&self) -> Result<Option<Value>, DomainError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::detection(
                    "snapshot",
                    format!("Failed to read {}: {}", self.path.display(), e),
                ));
            }
        };

        serde_json::from_slice(&data).map(Some).map_err(|e| {
            DomainError::detection(
                "snapshot",
                format!("Failed to parse {}: {}", self.path.display(), e),
            )
        })
    }
}

/// Snapshot reader for hosts without a state snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshot;

#[async_trait]
impl StateSnapshotReader for NoSnapshot {
    async fn read_snapshot(&self) -> Result<Option<Value>, DomainError> {
        Ok(None)
    }
}
