//! Orchestrator - lifecycle of scope routing inside a host
//!
//! Seeds the current scope at startup, keeps the config cache warm, puts the
//! interceptor in front of the host's entry points and reacts to host change
//! notifications until cleanup.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

use crate::config::RouterConfig;
use crate::domain::storage::{DocumentStoreExt, LAST_SCOPE_KEY};
use crate::domain::{
    diagnose, DetectionResult, Diagnosis, DocumentStore, DomainError, GenerationBackend, Message,
    Notifier, NotifyLevel, RawGenerationRequest, Scope, ScopeConfig, StateSnapshotReader,
};
use crate::infrastructure::services::ScopeConfigService;

use super::bus::{ChangeBus, HostEvent};
use super::config_store::ConfigStore;
use super::detector::{has_area_record, ScopeDetector};
use super::gateway::RequestGateway;
use super::interceptor::{InterceptorStats, ScopedInterceptor};
use super::stack::ScopeStack;

const CONNECTION_TEST_PROMPT: &str = "Connection test. Reply with OK.";

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Read-only view of the interception state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterceptorState {
    pub enabled: bool,
    pub current_scope: Scope,
    pub last_change_time: Option<DateTime<Utc>>,
    pub request_count: u64,
    pub error_count: u64,
}

/// Outcome of a backend connection test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub diagnosis: Option<Diagnosis>,
}

/// Collaborators supplied by the host
pub struct OrchestratorDeps {
    pub gateway: Arc<RequestGateway>,
    pub store: Arc<dyn DocumentStore>,
    pub snapshot: Arc<dyn StateSnapshotReader>,
    pub notifier: Arc<dyn Notifier>,
    pub bus: ChangeBus,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reacts to host notifications; shared with the listener task
struct ChangeHandler {
    detector: ScopeDetector,
    stack: Arc<ScopeStack>,
    configs: Arc<ConfigStore>,
    stats: Arc<InterceptorStats>,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
}

impl ChangeHandler {
    async fn on_event(&self, event: HostEvent) {
        match event {
            HostEvent::StateUpdated(variables) if has_area_record(&variables) => {
                debug!("Area record updated, re-detecting scope");
                self.rescan().await;
            }
            HostEvent::StateUpdated(_) => debug!("State update without area record ignored"),
            HostEvent::ScopeSelected(scope) => {
                self.select(scope).await;
            }
        }
    }

    async fn detect(&self) -> DetectionResult {
        let detection = self.detector.detect().await;

        if detection.is_fallback() {
            warn!(scope = %detection.scope, "Scope detection fell back to default");
        } else {
            debug!(
                scope = %detection.scope,
                confidence = %detection.confidence,
                source = %detection.source,
                "Scope detected"
            );
        }

        detection
    }

    /// Re-detects and applies a changed scope, returns the new scope if it changed
    async fn rescan(&self) -> Option<Scope> {
        let old = self.stack.current();
        let detection = self.detect().await;

        if detection.scope == old {
            debug!(scope = %old, "Scope unchanged");
            return None;
        }

        if let Err(e) = self.stack.set_current(detection.scope) {
            error!(from = %old, to = %detection.scope, error = %e, "Failed to apply detected scope");
            return None;
        }

        self.stats.mark_scope_change();
        self.configs.invalidate(None).await;

        let backend = match self.configs.get(detection.scope).await {
            Some(config) => format!("custom backend ({})", config.model),
            None => "host default backend".to_string(),
        };

        info!(
            from = %old,
            to = %detection.scope,
            confidence = %detection.confidence,
            source = %detection.source,
            backend = %backend,
            "Scope changed"
        );
        self.notifier.notify(
            NotifyLevel::Info,
            &format!(
                "Switched to {}, using {}",
                detection.scope.display_name(),
                backend
            ),
        );

        Some(detection.scope)
    }

    async fn select(&self, scope: Scope) -> Scope {
        match self.store.set(LAST_SCOPE_KEY, &scope).await {
            Ok(()) => info!(scope = %scope, "Scope selected"),
            Err(e) => warn!(scope = %scope, error = %e, "Failed to record selected scope"),
        }

        self.rescan().await;
        self.stack.current()
    }
}

/// Lifecycle glue between the host and the scope routing components
pub struct Orchestrator {
    gateway: Arc<RequestGateway>,
    service: Arc<ScopeConfigService>,
    stack: Arc<ScopeStack>,
    configs: Arc<ConfigStore>,
    stats: Arc<InterceptorStats>,
    bus: ChangeBus,
    notifier: Arc<dyn Notifier>,
    handler: Arc<ChangeHandler>,
    lifecycle: Mutex<LifecycleState>,
    original: Mutex<Option<Arc<dyn GenerationBackend>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("lifecycle", &self.lifecycle())
            .field("stack", &self.stack)
            .field("configs", &self.configs)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(deps: OrchestratorDeps, config: &RouterConfig) -> Self {
        let service = Arc::new(ScopeConfigService::new(Arc::clone(&deps.store)));
        let configs = Arc::new(
            ConfigStore::new(service.clone(), config.cache_ttl())
                .with_notifier(Arc::clone(&deps.notifier)),
        );
        let stack = Arc::new(
            ScopeStack::new(config.default_scope)
                .with_notifier(Arc::clone(&deps.notifier))
                .with_slow_threshold(config.slow_threshold()),
        );
        let stats = Arc::new(InterceptorStats::new());

        let handler = Arc::new(ChangeHandler {
            detector: ScopeDetector::new(deps.snapshot, Arc::clone(&deps.store)),
            stack: Arc::clone(&stack),
            configs: Arc::clone(&configs),
            stats: Arc::clone(&stats),
            store: deps.store,
            notifier: Arc::clone(&deps.notifier),
        });

        Self {
            gateway: deps.gateway,
            service,
            stack,
            configs,
            stats,
            bus: deps.bus,
            notifier: deps.notifier,
            handler,
            lifecycle: Mutex::new(LifecycleState::Uninitialized),
            original: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    pub fn stack(&self) -> &Arc<ScopeStack> {
        &self.stack
    }

    pub fn configs(&self) -> &Arc<ConfigStore> {
        &self.configs
    }

    pub fn service(&self) -> &Arc<ScopeConfigService> {
        &self.service
    }

    pub fn gateway(&self) -> &Arc<RequestGateway> {
        &self.gateway
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn lifecycle(&self) -> LifecycleState {
        *lock(&self.lifecycle)
    }

    /// Brings routing up. Each step is isolated: a failing step is logged and
    /// reported, and the orchestrator still ends up ready.
    pub async fn initialize(&self) {
        {
            let mut lifecycle = lock(&self.lifecycle);
            if *lifecycle != LifecycleState::Uninitialized {
                info!(state = ?*lifecycle, "Already initialized, skipping");
                return;
            }
            *lifecycle = LifecycleState::Initializing;
        }

        info!("Initializing scope routing");

        match self.service.ensure_document().await {
            Ok(true) => info!("Created empty scope config document"),
            Ok(false) => debug!("Scope config document present"),
            Err(e) => {
                error!(error = %e, "Scope config document check failed");
                self.notifier.notify(
                    NotifyLevel::Warn,
                    "Scope config service unavailable, the default backend will be used",
                );
            }
        }

        let detection = self.handler.detect().await;
        match self.stack.set_current(detection.scope) {
            Ok(()) => info!(scope = %detection.scope, source = %detection.source, "Initial scope set"),
            Err(e) => error!(scope = %detection.scope, error = %e, "Failed to apply initial scope"),
        }

        self.configs.preload().await;

        match self.install() {
            Ok(()) => self.stats.set_enabled(true),
            Err(e) => {
                error!(error = %e, "Interceptor install failed, routing disabled");
                self.notifier.notify(
                    NotifyLevel::Error,
                    "Scope routing could not be installed, the default backend will be used",
                );
                self.stats.set_enabled(false);
            }
        }

        if let Err(e) = self.subscribe() {
            warn!(error = %e, "Change subscription failed, scope changes must be selected manually");
            self.notifier.notify(
                NotifyLevel::Warn,
                "Scope change notifications unavailable, select scopes manually",
            );
        }

        *lock(&self.lifecycle) = LifecycleState::Ready;
        info!(scope = %self.stack.current(), "Scope routing ready");
        self.notifier
            .notify(NotifyLevel::Info, "Scope routing started");
    }

    /// Tears routing down and returns to uninitialized
    pub async fn cleanup(&self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
            debug!("Change listener stopped");
        }

        if let Err(e) = self.uninstall() {
            error!(error = %e, "Failed to restore original request handler");
        }

        self.configs.invalidate(None).await;
        self.stats.reset();
        *lock(&self.lifecycle) = LifecycleState::Uninitialized;

        info!("Scope routing cleaned up");
    }

    pub fn get_state(&self) -> InterceptorState {
        InterceptorState {
            enabled: self.stats.is_enabled(),
            current_scope: self.stack.current(),
            last_change_time: self.stats.last_change(),
            request_count: self.stats.request_count(),
            error_count: self.stats.error_count(),
        }
    }

    /// Config applied to requests issued right now
    pub async fn current_config(&self) -> Option<ScopeConfig> {
        self.configs.get(self.stack.current()).await
    }

    /// Runs `f` with `target` as the current scope
    pub async fn with_scope<F, Fut, T, E>(&self, target: Scope, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DomainError> + fmt::Display,
    {
        self.stack.with_scope(target, f).await
    }

    /// Re-detects the scope as if the host had reported a change
    pub async fn refresh_scope(&self) -> Option<Scope> {
        self.handler.rescan().await
    }

    /// Records an explicit scope choice and re-detects.
    ///
    /// The host snapshot still takes precedence over the recorded choice.
    pub async fn select_scope(&self, scope: Scope) -> Scope {
        self.handler.select(scope).await
    }

    /// Issues a short raw request under `scope` to check its backend
    pub async fn test_connection(&self, scope: Scope) -> ConnectionTestResult {
        if self.lifecycle() != LifecycleState::Ready {
            warn!(scope = %scope, "Connection test before initialization, scope config not applied");
        }

        let gateway = Arc::clone(&self.gateway);
        let request = RawGenerationRequest::new(vec![Message::user(CONNECTION_TEST_PROMPT)]);

        let result = self
            .stack
            .with_scope(scope, move || async move {
                gateway.issue_raw_request(request).await
            })
            .await;

        let outcome = match result {
            Ok(response) if response.trim().is_empty() => ConnectionTestResult {
                success: false,
                message: Diagnosis::EmptyResponse.hint().to_string(),
                diagnosis: Some(Diagnosis::EmptyResponse),
            },
            Ok(response) => ConnectionTestResult {
                success: true,
                message: format!(
                    "{} backend answered: {}",
                    scope.display_name(),
                    response.trim().chars().take(80).collect::<String>()
                ),
                diagnosis: None,
            },
            Err(e) => {
                let diagnosis = diagnose(&e.to_string());
                ConnectionTestResult {
                    success: false,
                    message: format!("{}. {}", e, diagnosis.hint()),
                    diagnosis: Some(diagnosis),
                }
            }
        };

        info!(scope = %scope, success = outcome.success, "Connection test finished");
        outcome
    }

    fn install(&self) -> Result<(), DomainError> {
        let mut original = lock(&self.original);
        if original.is_some() {
            debug!("Interceptor already installed");
            return Ok(());
        }

        let current = self.gateway.active()?;
        let interceptor = ScopedInterceptor::new(
            Arc::clone(&current),
            Arc::clone(&self.stack),
            Arc::clone(&self.configs),
            Arc::clone(&self.stats),
        )
        .with_notifier(Arc::clone(&self.notifier));

        self.gateway.swap(Arc::new(interceptor))?;
        info!(wrapped = current.backend_name(), "Interceptor installed");
        *original = Some(current);

        Ok(())
    }

    fn uninstall(&self) -> Result<(), DomainError> {
        let mut original = lock(&self.original);
        let Some(handler) = original.take() else {
            return Ok(());
        };

        if let Err(e) = self.gateway.swap(Arc::clone(&handler)) {
            *original = Some(handler);
            return Err(e);
        }

        info!(restored = handler.backend_name(), "Original request handler restored");
        Ok(())
    }

    fn subscribe(&self) -> Result<(), DomainError> {
        let mut listener = lock(&self.listener);
        if listener.is_some() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DomainError::internal(format!("No async runtime: {}", e)))?;

        let mut events = BroadcastStream::new(self.bus.subscribe());
        let handler = Arc::clone(&self.handler);

        *listener = Some(runtime.spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => handler.on_event(event).await,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Change events dropped, re-detecting scope");
                        handler.rescan().await;
                    }
                }
            }
            debug!("Change bus closed");
        }));

        info!("Subscribed to host change notifications");
        Ok(())
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}
