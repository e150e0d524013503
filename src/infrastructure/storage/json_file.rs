//! JSON-file document store: all documents in one JSON object on disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::storage::DocumentStore;
use crate::domain::DomainError;

/// Document store persisted as a single JSON object file.
///
/// Every write rewrites the file through a temporary sibling and a rename,
/// so a crash never leaves a half-written document set behind.
#[derive(Debug)]
pub struct JsonFileDocumentStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, DomainError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DomainError::storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_all(&self, documents: &Map<String, Value>) -> Result<(), DomainError> {
        let data = serde_json::to_vec_pretty(documents)
            .map_err(|e| DomainError::storage(format!("Failed to serialize documents: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await.map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), documents = documents.len(), "Document file written");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>, DomainError> {
        let mut documents = self.read_all().await?;
        Ok(documents.remove(key))
    }

    async fn set_raw(&self, key: &str, value: Value) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_all().await?;
        documents.insert(key.to_string(), value);
        self.write_all(&documents).await
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_all().await?;
        let existed = documents.remove(key).is_some();

        if existed {
            self.write_all(&documents).await?;
        }

        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileDocumentStore::new(dir.path().join("store.json"));

        assert_eq!(store.get_raw("api_configs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_documents_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileDocumentStore::new(&path);
        store.set_raw("last_scope", json!("sanctuary")).await.unwrap();
        store.set_raw("other", json!({"a": 1})).await.unwrap();

        let reopened = JsonFileDocumentStore::new(&path);
        assert_eq!(
            reopened.get_raw("last_scope").await.unwrap(),
            Some(json!("sanctuary"))
        );
        assert_eq!(reopened.get_raw("other").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileDocumentStore::new(dir.path().join("store.json"));
        store.set_raw("a", json!(1)).await.unwrap();

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
        assert_eq!(store.get_raw("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"[1, 2").await.unwrap();

        let store = JsonFileDocumentStore::new(&path);
        assert!(matches!(
            store.get_raw("a").await,
            Err(DomainError::Storage { .. })
        ));
    }
}
