//! Document store trait definition

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Small-document key-value store, persisted across sessions by the host.
///
/// Values are JSON documents. Use [`DocumentStoreExt`] for typed access.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a raw JSON document
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, DomainError>;

    /// Writes a raw JSON document, replacing any previous value
    async fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), DomainError>;

    /// Removes a document, returns true if it existed
    async fn remove(&self, key: &str) -> Result<bool, DomainError>;
}

/// Typed helpers on top of [`DocumentStore`]
pub trait DocumentStoreExt: DocumentStore {
    /// Reads and deserializes a document
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(value) => {
                    let typed: V = serde_json::from_value(value).map_err(|e| {
                        DomainError::storage(format!(
                            "Failed to deserialize document '{}': {}",
                            key, e
                        ))
                    })?;
                    Ok(Some(typed))
                }
                None => Ok(None),
            }
        }
    }

    /// Serializes and writes a document
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let raw = serde_json::to_value(value).map_err(|e| {
                DomainError::storage(format!("Failed to serialize document '{}': {}", key, e))
            })?;
            self.set_raw(key, raw).await
        }
    }
}

impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope::Scope;

    #[tokio::test]
    async fn test_typed_get_deserializes() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_raw()
            .withf(|key| key == "last_scope")
            .returning(|_| Ok(Some(serde_json::json!("sanctuary"))));

        let scope: Option<Scope> = store.get("last_scope").await.unwrap();
        assert_eq!(scope, Some(Scope::Sanctuary));
    }

    #[tokio::test]
    async fn test_typed_get_reports_malformed_document() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_raw()
            .returning(|_| Ok(Some(serde_json::json!({"not": "a scope"}))));

        let result: Result<Option<Scope>, _> = store.get("last_scope").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_typed_set_serializes() {
        let mut store = MockDocumentStore::new();
        store
            .expect_set_raw()
            .withf(|key, value| key == "last_scope" && value == &serde_json::json!("innerWorld"))
            .times(1)
            .returning(|_, _| Ok(()));

        store.set("last_scope", &Scope::InnerWorld).await.unwrap();
    }
}
