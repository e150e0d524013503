//! CLI module for the scoped LLM router
//!
//! Manages the per-scope backend document and lets operators check how
//! routing would behave:
//! - `show`, `set`, `clear`, `reset`, `validate`: edit the scope configs
//! - `detect`: classify a state snapshot
//! - `route`: dry-run a request through the interceptor

pub mod scopes;
pub mod detect;
pub mod route;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::{DocumentStore, Scope};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::ScopeConfigService;
use crate::infrastructure::storage::{StorageConfig, StorageFactory};

/// Scoped LLM router - per-scope backend overrides for generation requests
#[derive(Parser)]
#[command(name = "scoped-llm-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Document store file (overrides router.store_path)
    #[arg(long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the backend config of every scope, credentials masked
    Show,

    /// Set the backend config of one scope
    Set(scopes::SetArgs),

    /// Remove the config of one scope so it uses the host default backend
    Clear {
        /// Scope to clear
        scope: Scope,
    },

    /// Remove every scope config
    Reset,

    /// Validate the stored scope configs
    Validate,

    /// Detect the scope from a state snapshot file
    Detect(detect::DetectArgs),

    /// Show which backend a request would be routed to
    Route(route::RouteArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = bootstrap();
        let store = open_store(&config, self.store.as_deref());

        match self.command {
            Command::Show => scopes::show(&ScopeConfigService::new(store)).await,
            Command::Set(args) => scopes::set(&ScopeConfigService::new(store), args).await,
            Command::Clear { scope } => scopes::clear(&ScopeConfigService::new(store), scope).await,
            Command::Reset => scopes::reset(&ScopeConfigService::new(store)).await,
            Command::Validate => scopes::validate(&ScopeConfigService::new(store)).await,
            Command::Detect(args) => detect::run(store, args).await,
            Command::Route(args) => route::run(store, &config, args).await,
        }
    }
}

fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);

    config
}

fn open_store(config: &AppConfig, override_path: Option<&str>) -> Arc<dyn DocumentStore> {
    let path = override_path.or(config.router.store_path.as_deref());
    let storage = StorageConfig::from_path(path);

    tracing::debug!(storage = ?storage.storage_type(), "Opening document store");
    StorageFactory::create(&storage)
}
