use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::request::{GenerationRequest, RawGenerationRequest};
use crate::domain::DomainError;

/// The host's two generation entry points.
///
/// Transport, authentication and the model itself live behind this trait.
#[async_trait]
pub trait GenerationBackend: Send + Sync + Debug {
    /// Chat-driven generation
    async fn issue_request(&self, request: GenerationRequest) -> Result<String, DomainError>;

    /// Generation from caller-ordered prompts
    async fn issue_raw_request(&self, request: RawGenerationRequest)
        -> Result<String, DomainError>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}
