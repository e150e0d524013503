//! Scope routing - current scope tracking, config caching and request interception

mod bus;
mod config_store;
mod detector;
mod gateway;
mod interceptor;
mod notifier;
mod orchestrator;
mod snapshot;
mod stack;

pub use bus::{ChangeBus, HostEvent};
pub use config_store::{CacheEntry, ConfigStore, DEFAULT_CONFIG_TTL};
pub use detector::{classify_snapshot, has_area_record, ScopeDetector};
pub use gateway::RequestGateway;
pub use interceptor::{InterceptorStats, ScopedInterceptor};
pub use notifier::TracingNotifier;
pub use orchestrator::{
    ConnectionTestResult, InterceptorState, LifecycleState, Orchestrator, OrchestratorDeps,
};
pub use snapshot::{FileSnapshotReader, NoSnapshot};
pub use stack::{ScopeStack, ScopeSwitchHook, DEFAULT_SLOW_THRESHOLD};
