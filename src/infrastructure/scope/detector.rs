use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::storage::{DocumentStoreExt, LAST_SCOPE_KEY};
use crate::domain::{
    DetectionResult, DocumentStore, DomainError, Scope, StateSnapshotReader,
};

/// Keys searched for the area record, in order
const AREA_PATHS: [&[&str]; 3] = [&["stat_data", "current_area"], &["current_area"], &["location"]];

/// Works out the current scope from the host state, never failing
pub struct ScopeDetector {
    snapshot: Arc<dyn StateSnapshotReader>,
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for ScopeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeDetector").finish_non_exhaustive()
    }
}

impl ScopeDetector {
    pub fn new(snapshot: Arc<dyn StateSnapshotReader>, store: Arc<dyn DocumentStore>) -> Self {
        Self { snapshot, store }
    }

    /// Snapshot first, then the last selected scope, then the default
    pub async fn detect(&self) -> DetectionResult {
        match self.detect_from_snapshot().await {
            Ok(Some(scope)) => {
                info!(scope = %scope, "Scope detected from state snapshot");
                return DetectionResult::primary(scope);
            }
            Ok(None) => debug!("State snapshot carries no recognisable area"),
            Err(e) => warn!(error = %e, "Snapshot detection failed, trying last selected scope"),
        }

        match self.detect_from_last_selection().await {
            Ok(Some(scope)) => {
                info!(scope = %scope, "Scope taken from last selection");
                return DetectionResult::secondary(scope);
            }
            Ok(None) => debug!("No last selected scope stored"),
            Err(e) => warn!(error = %e, "Last selection lookup failed, using default scope"),
        }

        let result = DetectionResult::fallback();
        info!(scope = %result.scope, "Scope detection fell back to default");
        result
    }

    async fn detect_from_snapshot(&self) -> Result<Option<Scope>, DomainError> {
        let snapshot = self
            .snapshot
            .read_snapshot()
            .await
            .map_err(|e| DomainError::detection("snapshot", e.to_string()))?;

        Ok(snapshot.as_ref().and_then(classify_snapshot))
    }

    async fn detect_from_last_selection(&self) -> Result<Option<Scope>, DomainError> {
        self.store
            .get::<Scope>(LAST_SCOPE_KEY)
            .await
            .map_err(|e| DomainError::detection("last_scope", e.to_string()))
    }
}

/// Classifies a host snapshot by its area record
pub fn classify_snapshot(snapshot: &Value) -> Option<Scope> {
    AREA_PATHS
        .iter()
        .filter_map(|path| lookup(snapshot, path))
        .find_map(classify_area)
}

/// True when the value carries an area record at any known path
pub fn has_area_record(value: &Value) -> bool {
    AREA_PATHS.iter().any(|path| lookup(value, path).is_some())
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .filter(|v| !v.is_null())
}

fn classify_area(area: &Value) -> Option<Scope> {
    if let Some(tag) = area.as_str() {
        return classify_tag(tag);
    }

    let type_tag = area.get("type").and_then(Value::as_str);

    if type_tag.map(str::trim) == Some("sanctuary") {
        return Some(Scope::Sanctuary);
    }

    match area.get("is_inner_world").and_then(Value::as_bool) {
        Some(true) => return Some(Scope::InnerWorld),
        Some(false) => return Some(Scope::RealWorld),
        None => {}
    }

    type_tag.and_then(classify_tag)
}

fn classify_tag(tag: &str) -> Option<Scope> {
    match tag.trim() {
        "instance" | "inner_world_instance" => Some(Scope::InnerWorld),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::host::MockStateSnapshotReader;
    use crate::domain::storage::MockDocumentStore;
    use crate::domain::{Confidence, DetectionSource};
    use crate::infrastructure::storage::InMemoryDocumentStore;
    use serde_json::json;

    fn reader(snapshot: Option<Value>) -> Arc<MockStateSnapshotReader> {
        let mut reader = MockStateSnapshotReader::new();
        reader
            .expect_read_snapshot()
            .returning(move || Ok(snapshot.clone()));
        Arc::new(reader)
    }

    fn failing_reader() -> Arc<MockStateSnapshotReader> {
        let mut reader = MockStateSnapshotReader::new();
        reader
            .expect_read_snapshot()
            .returning(|| Err(DomainError::internal("variable framework not ready")));
        Arc::new(reader)
    }

    fn store_with_last(scope: Scope) -> Arc<InMemoryDocumentStore> {
        Arc::new(InMemoryDocumentStore::with_documents(vec![(
            LAST_SCOPE_KEY.to_string(),
            json!(scope),
        )]))
    }

    #[test]
    fn test_classify_snapshot_shapes() {
        assert_eq!(
            classify_snapshot(&json!({"stat_data": {"current_area": {"type": "sanctuary"}}})),
            Some(Scope::Sanctuary)
        );
        assert_eq!(
            classify_snapshot(&json!({"stat_data": {"current_area": {"name": "Ruins", "is_inner_world": true}}})),
            Some(Scope::InnerWorld)
        );
        assert_eq!(
            classify_snapshot(&json!({"current_area": {"is_inner_world": false}})),
            Some(Scope::RealWorld)
        );
        assert_eq!(
            classify_snapshot(&json!({"location": {"type": "instance"}})),
            Some(Scope::InnerWorld)
        );
        assert_eq!(classify_snapshot(&json!({"location": "realWorld"})), Some(Scope::RealWorld));
    }

    #[test]
    fn test_unknown_area_falls_through_to_next_path() {
        let snapshot = json!({
            "stat_data": {"current_area": {"type": "tavern"}},
            "location": {"type": "sanctuary"}
        });
        assert_eq!(classify_snapshot(&snapshot), Some(Scope::Sanctuary));

        assert_eq!(classify_snapshot(&json!({"stat_data": {"current_area": {"type": 7}}})), None);
        assert_eq!(classify_snapshot(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_has_area_record() {
        assert!(has_area_record(&json!({"stat_data": {"current_area": {"name": "x"}}})));
        assert!(!has_area_record(&json!({"stat_data": {"hp": 10}})));
        assert!(!has_area_record(&json!({"current_area": null})));
    }

    #[tokio::test]
    async fn test_primary_source_wins() {
        let detector = ScopeDetector::new(
            reader(Some(json!({"stat_data": {"current_area": {"is_inner_world": true}}}))),
            store_with_last(Scope::Sanctuary),
        );

        let result = detector.detect().await;

        assert_eq!(result.scope, Scope::InnerWorld);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.source, DetectionSource::Primary);
    }

    #[tokio::test]
    async fn test_unusable_snapshot_falls_back_to_last_selection() {
        let detector = ScopeDetector::new(
            reader(Some(json!({"stat_data": {}}))),
            store_with_last(Scope::Sanctuary),
        );

        let result = detector.detect().await;

        assert_eq!(result, DetectionResult::secondary(Scope::Sanctuary));
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_failing_snapshot_falls_back_to_last_selection() {
        let detector = ScopeDetector::new(failing_reader(), store_with_last(Scope::InnerWorld));

        assert_eq!(
            detector.detect().await,
            DetectionResult::secondary(Scope::InnerWorld)
        );
    }

    #[tokio::test]
    async fn test_everything_failing_yields_default() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_raw()
            .returning(|_| Err(DomainError::storage("store offline")));

        let detector = ScopeDetector::new(failing_reader(), Arc::new(store));
        let result = detector.detect().await;

        assert_eq!(result.scope, Scope::RealWorld);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn test_malformed_last_selection_yields_default() {
        let store = Arc::new(InMemoryDocumentStore::with_documents(vec![(
            LAST_SCOPE_KEY.to_string(),
            json!("upsideDown"),
        )]));
        let detector = ScopeDetector::new(reader(None), store);

        assert_eq!(detector.detect().await, DetectionResult::fallback());
    }
}
