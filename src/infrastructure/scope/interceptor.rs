use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::redact::{summarize, RedactedConfig};
use crate::domain::request::OverridableRequest;
use crate::domain::scope_config::{describe_errors, validate_scope_config};
use crate::domain::{
    CustomApi, DomainError, GenerationBackend, GenerationRequest, Notifier, NotifyLevel,
    RawGenerationRequest, Scope, ScopeConfig,
};
use crate::infrastructure::observability::{
    record_intercepted_request, InterceptedRequestMetricParams,
};

use super::config_store::ConfigStore;
use super::stack::ScopeStack;

/// Process-wide interception counters, reset only on cleanup
#[derive(Debug, Default)]
pub struct InterceptorStats {
    enabled: AtomicBool,
    requests: AtomicU64,
    errors: AtomicU64,
    last_change: Mutex<Option<DateTime<Utc>>>,
}

impl InterceptorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Counts a request and returns its sequence number
    pub fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Counts a failed request and returns the error total
    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn mark_scope_change(&self) {
        *self.last_change.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    pub fn last_change(&self) -> Option<DateTime<Utc>> {
        *self.last_change.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reset(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.requests.store(0, Ordering::SeqCst);
        self.errors.store(0, Ordering::SeqCst);
        *self.last_change.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

struct Prepared<R> {
    request: R,
    /// `None` when the caller supplied its own override
    scope: Option<Scope>,
    config: Option<ScopeConfig>,
}

/// Wraps the host's entry points and applies the current scope's backend config
#[derive(Debug)]
pub struct ScopedInterceptor {
    inner: Arc<dyn GenerationBackend>,
    stack: Arc<ScopeStack>,
    configs: Arc<ConfigStore>,
    stats: Arc<InterceptorStats>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ScopedInterceptor {
    pub fn new(
        inner: Arc<dyn GenerationBackend>,
        stack: Arc<ScopeStack>,
        configs: Arc<ConfigStore>,
        stats: Arc<InterceptorStats>,
    ) -> Self {
        Self {
            inner,
            stack,
            configs,
            stats,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The wrapped handler
    pub fn inner(&self) -> Arc<dyn GenerationBackend> {
        Arc::clone(&self.inner)
    }

    async fn prepare<R: OverridableRequest>(&self, request: R, number: u64) -> Prepared<R> {
        if request.has_explicit_override() {
            debug!(entry_point = R::ENTRY_POINT, number, "Request carries its own backend, passing through");
            return Prepared {
                request,
                scope: None,
                config: None,
            };
        }

        let scope = self.stack.current();
        let Some(config) = self.configs.get(scope).await else {
            debug!(entry_point = R::ENTRY_POINT, number, scope = %scope, "Using host default backend");
            return Prepared {
                request,
                scope: Some(scope),
                config: None,
            };
        };

        if let Err(errors) = validate_scope_config(&config) {
            let problems = describe_errors(&errors);
            warn!(
                entry_point = R::ENTRY_POINT,
                number,
                scope = %scope,
                problems = %problems,
                "Scope config invalid, sending request unchanged"
            );
            self.notify(
                NotifyLevel::Warn,
                &format!("Backend config invalid: {}", problems),
            );
            return Prepared {
                request,
                scope: Some(scope),
                config: None,
            };
        }

        info!(
            entry_point = R::ENTRY_POINT,
            number,
            scope = %scope,
            config = %RedactedConfig(&config),
            "Applying scope backend config"
        );

        Prepared {
            request: request.with_custom_api(CustomApi::from(&config)),
            scope: Some(scope),
            config: Some(config),
        }
    }

    async fn intercept<R, F, Fut>(&self, request: R, call: F) -> Result<String, DomainError>
    where
        R: OverridableRequest,
        F: FnOnce(Arc<dyn GenerationBackend>, R) -> Fut,
        Fut: Future<Output = Result<String, DomainError>>,
    {
        let number = self.stats.record_request();
        let prepared = self.prepare(request, number).await;

        let started = Instant::now();
        let result = call(Arc::clone(&self.inner), prepared.request).await;

        record_intercepted_request(InterceptedRequestMetricParams {
            entry_point: R::ENTRY_POINT,
            scope: prepared.scope,
            custom: prepared.config.is_some(),
            duration: started.elapsed(),
            success: result.is_ok(),
        });

        match result {
            Ok(response) => {
                debug!(entry_point = R::ENTRY_POINT, number, "Request succeeded");
                Ok(response)
            }
            Err(e) => {
                let errors = self.stats.record_error();
                error!(
                    entry_point = R::ENTRY_POINT,
                    number,
                    errors,
                    scope = %prepared.scope.map_or("explicit", |s| s.as_str()),
                    config = %summarize(prepared.config.as_ref()),
                    error = %e,
                    "Request failed"
                );
                self.notify(
                    NotifyLevel::Error,
                    &format!("Generation request failed: {}", e),
                );
                Err(e)
            }
        }
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(level, message);
        }
    }
}

#[async_trait]
impl GenerationBackend for ScopedInterceptor {
    async fn issue_request(&self, request: GenerationRequest) -> Result<String, DomainError> {
        self.intercept(request, |backend, request| async move {
            backend.issue_request(request).await
        })
        .await
    }

    async fn issue_raw_request(
        &self,
        request: RawGenerationRequest,
    ) -> Result<String, DomainError> {
        self.intercept(request, |backend, request| async move {
            backend.issue_raw_request(request).await
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "scoped"
    }
}
