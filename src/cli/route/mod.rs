//! Route command - dry-runs a request through the scope interceptor
//!
//! The request never leaves the process: a stand-in backend reports which
//! override the interceptor attached.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;

use crate::config::AppConfig;
use crate::domain::redact::{mask_secret, truncate_endpoint};
use crate::domain::{
    CustomApi, DocumentStore, DomainError, GenerationBackend, GenerationRequest,
    RawGenerationRequest, Scope,
};
use crate::infrastructure::scope::{
    ChangeBus, Orchestrator, OrchestratorDeps, RequestGateway, TracingNotifier,
};

use super::detect::snapshot_reader;

/// Arguments for the route command
#[derive(Args, Clone, Debug)]
pub struct RouteArgs {
    /// JSON state snapshot used to seed the current scope
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Route under this scope instead of the detected one
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Prompt to send
    #[arg(default_value = "ping")]
    pub prompt: String,
}

/// Backend that answers with a description of the override it received
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn describe(custom_api: Option<&CustomApi>) -> String {
        match custom_api {
            Some(api) => format!(
                "custom backend: model={} endpoint={} key={}",
                api.model,
                truncate_endpoint(&api.apiurl),
                mask_secret(&api.key)
            ),
            None => "host default backend".to_string(),
        }
    }
}

#[async_trait]
impl GenerationBackend for DryRunBackend {
    async fn issue_request(&self, request: GenerationRequest) -> Result<String, DomainError> {
        Ok(Self::describe(request.custom_api.as_ref()))
    }

    async fn issue_raw_request(
        &self,
        request: RawGenerationRequest,
    ) -> Result<String, DomainError> {
        Ok(Self::describe(request.custom_api.as_ref()))
    }

    fn backend_name(&self) -> &'static str {
        "dry-run"
    }
}

pub async fn run(
    store: Arc<dyn DocumentStore>,
    config: &AppConfig,
    args: RouteArgs,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(
        OrchestratorDeps {
            gateway: Arc::new(RequestGateway::new(Arc::new(DryRunBackend))),
            store,
            snapshot: snapshot_reader(args.snapshot),
            notifier: Arc::new(TracingNotifier),
            bus: ChangeBus::default(),
        },
        &config.router,
    );

    orchestrator.initialize().await;

    let target = args.scope.unwrap_or_else(|| orchestrator.stack().current());
    let gateway = Arc::clone(orchestrator.gateway());
    let request = GenerationRequest::new(args.prompt);

    let outcome = orchestrator
        .with_scope(target, move || async move { gateway.issue_request(request).await })
        .await;

    orchestrator.cleanup().await;

    println!("{} ({}): {}", target.display_name(), target, outcome?);
    Ok(())
}
