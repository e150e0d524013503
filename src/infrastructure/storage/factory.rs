//! Storage factory for runtime store selection

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::domain::storage::DocumentStore;

use super::in_memory::InMemoryDocumentStore;
use super::json_file::JsonFileDocumentStore;

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// Single JSON file on disk
    JsonFile,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "file" | "json" | "json_file" | "json-file" => Some(Self::JsonFile),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// JSON file storage at the given path
    JsonFile(PathBuf),
}

impl StorageConfig {
    /// Picks the file store when a path is configured, memory otherwise
    pub fn from_path(path: Option<&str>) -> Self {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => Self::JsonFile(PathBuf::from(path)),
            None => Self::InMemory,
        }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::JsonFile(_) => StorageType::JsonFile,
        }
    }
}

/// Factory for creating document store instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a document store based on the configuration
    pub fn create(config: &StorageConfig) -> Arc<dyn DocumentStore> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory document store");
                Arc::new(InMemoryDocumentStore::new())
            }
            StorageConfig::JsonFile(path) => {
                info!(path = %path.display(), "Using JSON file document store");
                Arc::new(JsonFileDocumentStore::new(path.clone()))
            }
        }
    }
}
