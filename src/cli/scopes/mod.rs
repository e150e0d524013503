//! Scope config commands - show, set, clear, reset and validate

use clap::Args;

use crate::domain::redact::summarize;
use crate::domain::scope_config::describe_errors;
use crate::domain::{MultiScopeConfig, Scope, ScopeConfig};
use crate::infrastructure::services::ScopeConfigService;

/// Arguments for the set command
#[derive(Args, Clone, Debug)]
pub struct SetArgs {
    /// Scope to configure (realWorld, innerWorld, sanctuary)
    pub scope: Scope,

    /// OpenAI-compatible endpoint URL
    #[arg(long)]
    pub endpoint: String,

    /// API key; may be omitted for a local backend
    #[arg(long, default_value = "")]
    pub key: String,

    /// Model name
    #[arg(long)]
    pub model: String,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,
}

impl SetArgs {
    pub fn to_config(&self) -> ScopeConfig {
        let mut config = ScopeConfig::new(&self.endpoint, &self.key, &self.model);

        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }

        config
    }
}

/// One line per scope, credentials masked
pub fn render(configs: &MultiScopeConfig) -> String {
    Scope::ALL
        .iter()
        .map(|scope| {
            format!(
                "{:<22} {:<11} {}",
                scope.display_name(),
                scope.as_str(),
                summarize(configs.get(*scope))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn show(service: &ScopeConfigService) -> anyhow::Result<()> {
    let configs = service.try_load_all().await?;
    println!("{}", render(&configs));
    Ok(())
}

pub async fn set(service: &ScopeConfigService, args: SetArgs) -> anyhow::Result<()> {
    let config = args.to_config();
    service.update(args.scope, Some(config)).await?;

    println!("{} now uses model {}", args.scope.display_name(), args.model);
    Ok(())
}

pub async fn clear(service: &ScopeConfigService, scope: Scope) -> anyhow::Result<()> {
    service.update(scope, None).await?;

    println!("{} now uses the host default backend", scope.display_name());
    Ok(())
}

pub async fn reset(service: &ScopeConfigService) -> anyhow::Result<()> {
    service.reset().await?;

    println!("All scopes now use the host default backend");
    Ok(())
}

pub async fn validate(service: &ScopeConfigService) -> anyhow::Result<()> {
    let reports = service.validate().await?;

    if reports.is_empty() {
        println!("All scope configs are valid");
        return Ok(());
    }

    for report in &reports {
        println!("{}: {}", report.scope, describe_errors(&report.errors));
    }

    anyhow::bail!("{} scope config(s) invalid", reports.len())
}
