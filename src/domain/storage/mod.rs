//! Storage domain - key-value document store abstraction

mod repository;

pub use repository::{DocumentStore, DocumentStoreExt};

#[cfg(test)]
pub use repository::MockDocumentStore;

/// Document key holding the per-scope configuration
pub const API_CONFIGS_KEY: &str = "api_configs";

/// Document key holding the last explicitly selected scope
pub const LAST_SCOPE_KEY: &str = "last_scope";
