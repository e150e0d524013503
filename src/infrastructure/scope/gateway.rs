use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::{DomainError, GenerationBackend, GenerationRequest, RawGenerationRequest};

/// Stable entry point every call site issues generation requests through.
///
/// The handler behind it can be swapped at runtime; in-flight calls keep the
/// handler they started with.
#[derive(Debug)]
pub struct RequestGateway {
    active: RwLock<Arc<dyn GenerationBackend>>,
}

impl RequestGateway {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            active: RwLock::new(backend),
        }
    }

    /// Handler currently serving requests
    pub fn active(&self) -> Result<Arc<dyn GenerationBackend>, DomainError> {
        let active = self.active.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(Arc::clone(&active))
    }

    /// Installs a new handler and returns the one it replaced
    pub fn swap(
        &self,
        handler: Arc<dyn GenerationBackend>,
    ) -> Result<Arc<dyn GenerationBackend>, DomainError> {
        let mut active = self.active.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(std::mem::replace(&mut *active, handler))
    }
}

#[async_trait]
impl GenerationBackend for RequestGateway {
    async fn issue_request(&self, request: GenerationRequest) -> Result<String, DomainError> {
        self.active()?.issue_request(request).await
    }

    async fn issue_raw_request(
        &self,
        request: RawGenerationRequest,
    ) -> Result<String, DomainError> {
        self.active()?.issue_raw_request(request).await
    }

    fn backend_name(&self) -> &'static str {
        "gateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::host::RecordingBackend;

    #[tokio::test]
    async fn test_requests_reach_active_handler() {
        let first = Arc::new(RecordingBackend::new().with_response("first"));
        let gateway = RequestGateway::new(first.clone());

        let response = gateway
            .issue_request(GenerationRequest::new("hello"))
            .await
            .unwrap();

        assert_eq!(response, "first");
        assert_eq!(first.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_swap_returns_previous_handler() {
        let first = Arc::new(RecordingBackend::new().with_response("first"));
        let second = Arc::new(RecordingBackend::new().with_response("second"));
        let gateway = RequestGateway::new(first.clone());

        let previous = gateway.swap(second.clone()).unwrap();
        assert_eq!(previous.backend_name(), "recording");

        let response = gateway
            .issue_raw_request(RawGenerationRequest::new(Vec::new()))
            .await
            .unwrap();

        assert_eq!(response, "second");
        assert!(first.raw_requests().is_empty());
        assert_eq!(second.raw_requests().len(), 1);
    }
}
