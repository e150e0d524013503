//! Scoped LLM router
//!
//! Routes a host application's generation requests to a per-scope backend:
//! - Nested, failure-safe scope switching (`ScopeStack::with_scope`)
//! - Cached per-scope backend configs with TTL and negative caching
//! - Scope detection from host state with graceful fallback
//! - Request interception that honours explicit caller overrides

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{DomainError, Scope, ScopeConfig};
pub use infrastructure::scope::{Orchestrator, OrchestratorDeps, ScopeStack};
