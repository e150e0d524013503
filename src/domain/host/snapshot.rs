use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Reader for the host's structured game-state snapshot.
///
/// The document shape is owned by the host and never trusted: callers parse
/// it defensively.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateSnapshotReader: Send + Sync {
    /// Returns the current snapshot, or `None` when the host has none yet
    async fn read_snapshot(&self) -> Result<Option<serde_json::Value>, DomainError>;
}
