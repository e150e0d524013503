//! Scope configuration service - Manages the per-scope backend document

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::domain::scope_config::{describe_errors, validate_scope_config};
use crate::domain::storage::{DocumentStoreExt, API_CONFIGS_KEY};
use crate::domain::{
    DocumentStore, DomainError, MultiScopeConfig, Scope, ScopeConfig, ScopeConfigSource,
    ScopeConfigValidationError,
};

/// Validation problems found for one scope
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeValidationReport {
    pub scope: Scope,
    pub errors: Vec<ScopeConfigValidationError>,
}

/// Service for reading and editing the `api_configs` document
#[derive(Clone)]
pub struct ScopeConfigService {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for ScopeConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeConfigService").finish_non_exhaustive()
    }
}

impl ScopeConfigService {
    /// Create a new ScopeConfigService over the given document store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reads the whole document; a missing document means every scope uses the host default.
    ///
    /// Each scope is read on its own: a malformed record is logged and treated
    /// as unset without affecting the other scopes.
    pub async fn try_load_all(&self) -> Result<MultiScopeConfig, DomainError> {
        let document = self.load_document().await?;
        let mut configs = MultiScopeConfig::default();

        for scope in Scope::ALL {
            match parse_entry(scope, document.get(scope.as_str())) {
                Ok(config) => configs.set(scope, config),
                Err(e) => warn!(scope = %scope, error = %e, "Skipping malformed scope config"),
            }
        }

        Ok(configs)
    }

    /// Reads the whole document, degrading to all-default on store errors
    pub async fn load_all(&self) -> MultiScopeConfig {
        match self.try_load_all().await {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "Failed to load scope configs, using host defaults");
                MultiScopeConfig::default()
            }
        }
    }

    /// Get the stored config for one scope; only that scope's record is parsed
    pub async fn get(&self, scope: Scope) -> Result<Option<ScopeConfig>, DomainError> {
        let document = self.load_document().await?;
        parse_entry(scope, document.get(scope.as_str()))
    }

    /// Replace one scope's config; `None` returns the scope to the host default.
    ///
    /// Invalid configs are rejected and nothing is written. Records of the
    /// other scopes are written back as stored.
    pub async fn update(&self, scope: Scope, config: Option<ScopeConfig>) -> Result<(), DomainError> {
        if let Some(config) = &config {
            validate_scope_config(config).map_err(|errors| {
                DomainError::validation(format!(
                    "Invalid config for {}: {}",
                    scope,
                    describe_errors(&errors)
                ))
            })?;
        }

        let mut document = self.load_document().await?;
        let custom = config.is_some();
        let entry = serde_json::to_value(&config).map_err(|e| {
            DomainError::storage(format!("Failed to serialize {} config: {}", scope, e))
        })?;

        document.insert(scope.as_str().to_string(), entry);
        for other in Scope::ALL {
            document
                .entry(other.as_str().to_string())
                .or_insert(Value::Null);
        }
        self.store
            .set_raw(API_CONFIGS_KEY, Value::Object(document))
            .await?;

        info!(scope = %scope, custom, "Scope config updated");
        Ok(())
    }

    async fn load_document(&self) -> Result<Map<String, Value>, DomainError> {
        match self.store.get_raw(API_CONFIGS_KEY).await? {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(document)) => Ok(document),
            Some(_) => Err(DomainError::storage(format!(
                "Document '{}' is not a JSON object",
                API_CONFIGS_KEY
            ))),
        }
    }

    /// Reset every scope to the host default
    pub async fn reset(&self) -> Result<(), DomainError> {
        self.store
            .set(API_CONFIGS_KEY, &MultiScopeConfig::default())
            .await?;

        info!("Scope configs reset to host defaults");
        Ok(())
    }

    /// Writes an empty document if none exists yet, returns true when it did
    pub async fn ensure_document(&self) -> Result<bool, DomainError> {
        if self.store.get_raw(API_CONFIGS_KEY).await?.is_some() {
            return Ok(false);
        }

        self.reset().await?;
        Ok(true)
    }

    /// Validates every configured scope and reports the ones with problems
    pub async fn validate(&self) -> Result<Vec<ScopeValidationReport>, DomainError> {
        let document = self.load_document().await?;

        let reports: Vec<ScopeValidationReport> = Scope::ALL
            .iter()
            .filter_map(|scope| {
                let errors = match parse_entry(*scope, document.get(scope.as_str())) {
                    Ok(config) => validate_scope_config(config.as_ref()?).err()?,
                    Err(e) => vec![ScopeConfigValidationError::Malformed {
                        reason: e.to_string(),
                    }],
                };
                Some(ScopeValidationReport {
                    scope: *scope,
                    errors,
                })
            })
            .collect();

        for report in &reports {
            warn!(
                scope = %report.scope,
                problems = %describe_errors(&report.errors),
                "Stored scope config is invalid"
            );
        }

        Ok(reports)
    }
}

fn parse_entry(scope: Scope, entry: Option<&Value>) -> Result<Option<ScopeConfig>, DomainError> {
    match entry {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            DomainError::storage(format!("Malformed {} config: {}", scope, e))
        }),
    }
}

#[async_trait]
impl ScopeConfigSource for ScopeConfigService {
    async fn load(&self, scope: Scope) -> Result<Option<ScopeConfig>, DomainError> {
        self.get(scope).await
    }
}
