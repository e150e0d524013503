use async_trait::async_trait;

use crate::domain::scope::Scope;
use crate::domain::DomainError;

use super::ScopeConfig;

#[cfg(test)]
use mockall::automock;

/// Backing source the config cache loads from
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScopeConfigSource: Send + Sync {
    /// Loads the stored config for a scope; `Ok(None)` means none is stored
    async fn load(&self, scope: Scope) -> Result<Option<ScopeConfig>, DomainError>;
}
