//! In-memory document store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::DocumentStore;
use crate::domain::DomainError;

/// Thread-safe in-memory document store
///
/// Useful for testing and for hosts that persist documents themselves.
/// Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with documents
    pub fn with_documents(documents: Vec<(String, serde_json::Value)>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        let documents = self.documents.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(documents.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), DomainError> {
        let mut documents = self.documents.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        documents.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        let mut documents = self.documents.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(documents.remove(key).is_some())
    }
}
