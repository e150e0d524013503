//! Domain layer - Core types, contracts and validation rules

pub mod diagnostics;
pub mod error;
pub mod host;
pub mod redact;
pub mod request;
pub mod scope;
pub mod scope_config;
pub mod storage;

pub use diagnostics::{diagnose, Diagnosis};
pub use error::DomainError;
pub use host::{GenerationBackend, Notifier, NotifyLevel, StateSnapshotReader};
pub use redact::{mask_secret, truncate_endpoint, RedactedConfig};
pub use request::{
    CustomApi, GenerationRequest, Message, MessageRole, OverridableRequest, RawGenerationRequest,
};
pub use scope::{Confidence, DetectionResult, DetectionSource, Scope};
pub use scope_config::{
    validate_scope_config, MultiScopeConfig, ScopeConfig, ScopeConfigSource,
    ScopeConfigValidationError,
};
pub use storage::{DocumentStore, DocumentStoreExt};
