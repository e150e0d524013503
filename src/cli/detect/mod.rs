//! Detect command - classifies a state snapshot the way the router would

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::domain::{DetectionResult, DocumentStore, StateSnapshotReader};
use crate::infrastructure::scope::{FileSnapshotReader, NoSnapshot, ScopeDetector};

/// Arguments for the detect command
#[derive(Args, Clone, Debug)]
pub struct DetectArgs {
    /// JSON state snapshot; only the last selected scope is used when omitted
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn snapshot_reader(path: Option<PathBuf>) -> Arc<dyn StateSnapshotReader> {
    match path {
        Some(path) => Arc::new(FileSnapshotReader::new(path)),
        None => Arc::new(NoSnapshot),
    }
}

pub fn render(result: &DetectionResult) -> String {
    format!(
        "{} ({}) confidence={} source={}",
        result.scope.display_name(),
        result.scope,
        result.confidence,
        result.source
    )
}

pub async fn run(store: Arc<dyn DocumentStore>, args: DetectArgs) -> anyhow::Result<()> {
    let detector = ScopeDetector::new(snapshot_reader(args.snapshot), store);
    let result = detector.detect().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render(&result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Scope;
    use crate::infrastructure::storage::InMemoryDocumentStore;

    #[tokio::test]
    async fn test_detects_from_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"stat_data": {"current_area": {"type": "sanctuary"}}}"#).unwrap();

        let detector = ScopeDetector::new(
            snapshot_reader(Some(path)),
            Arc::new(InMemoryDocumentStore::new()),
        );
        let result = detector.detect().await;

        assert_eq!(result, DetectionResult::primary(Scope::Sanctuary));
        assert!(render(&result).starts_with("Sanctuary (sanctuary)"));
    }

    #[tokio::test]
    async fn test_without_snapshot_uses_fallback() {
        let detector = ScopeDetector::new(snapshot_reader(None), Arc::new(InMemoryDocumentStore::new()));

        assert!(detector.detect().await.is_fallback());
    }
}
