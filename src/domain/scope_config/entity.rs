use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::redact::mask_secret;
use crate::domain::scope::Scope;

/// Default sampling temperature for a new scope config
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Default completion budget for a new scope config
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Backend override for one scope.
///
/// Absence of a `ScopeConfig` for a scope means the host's default backend
/// is used. Field names on the wire follow the stored document format.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeConfig {
    #[serde(rename = "apiurl", default)]
    pub endpoint: String,
    #[serde(rename = "key", default)]
    pub credential: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl ScopeConfig {
    pub fn new(
        endpoint: impl Into<String>,
        credential: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// Debug output must never carry the full credential
impl fmt::Debug for ScopeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &mask_secret(&self.credential))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Per-scope configuration document as persisted in the key-value store.
///
/// `None` for a scope means "use the host default backend".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiScopeConfig {
    #[serde(default)]
    pub real_world: Option<ScopeConfig>,
    #[serde(default)]
    pub inner_world: Option<ScopeConfig>,
    #[serde(default)]
    pub sanctuary: Option<ScopeConfig>,
}

impl MultiScopeConfig {
    pub fn get(&self, scope: Scope) -> Option<&ScopeConfig> {
        match scope {
            Scope::RealWorld => self.real_world.as_ref(),
            Scope::InnerWorld => self.inner_world.as_ref(),
            Scope::Sanctuary => self.sanctuary.as_ref(),
        }
    }

    pub fn set(&mut self, scope: Scope, config: Option<ScopeConfig>) {
        let slot = match scope {
            Scope::RealWorld => &mut self.real_world,
            Scope::InnerWorld => &mut self.inner_world,
            Scope::Sanctuary => &mut self.sanctuary,
        };
        *slot = config;
    }

    pub fn with(mut self, scope: Scope, config: ScopeConfig) -> Self {
        self.set(scope, Some(config));
        self
    }

    /// Number of scopes with a custom backend
    pub fn configured_count(&self) -> usize {
        Scope::ALL.iter().filter(|s| self.get(**s).is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_config_wire_format() {
        let json = serde_json::json!({
            "apiurl": "https://api.example.com/v1",
            "key": "sk-abcdefgh12345678",
            "model": "gpt-4o",
            "temperature": 0.7,
            "max_tokens": 1024
        });

        let config: ScopeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.endpoint, "https://api.example.com/v1");
        assert_eq!(config.credential, "sk-abcdefgh12345678");
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn test_scope_config_defaults() {
        let json = serde_json::json!({
            "apiurl": "http://localhost:5001",
            "model": "local"
        });

        let config: ScopeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.credential, "");
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_incomplete_record_parses_and_fails_validation() {
        let json = serde_json::json!({"apiurl": "https://api.example.com/v1", "key": "sk-abcdefgh12345678"});

        let config: ScopeConfig = serde_json::from_value(json).unwrap();

        assert_eq!(config.model, "");
        assert_eq!(
            crate::domain::scope_config::validate_scope_config(&config),
            Err(vec![crate::domain::scope_config::ScopeConfigValidationError::EmptyModel])
        );
    }

    #[test]
    fn test_debug_masks_credential() {
        let config = ScopeConfig::new("https://api.example.com", "sk-abcdefgh12345678", "m");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("sk-abcdefgh12345678"));
        assert!(debug.contains("sk-a...5678"));
    }

    #[test]
    fn test_multi_scope_config_document_format() {
        let json = serde_json::json!({
            "realWorld": null,
            "innerWorld": {"apiurl": "https://inner.example.com", "key": "k-123456789", "model": "creative"},
            "sanctuary": null
        });

        let doc: MultiScopeConfig = serde_json::from_value(json).unwrap();
        assert!(doc.get(Scope::RealWorld).is_none());
        assert_eq!(doc.get(Scope::InnerWorld).unwrap().model, "creative");
        assert_eq!(doc.configured_count(), 1);
    }

    #[test]
    fn test_multi_scope_config_set() {
        let mut doc = MultiScopeConfig::default();
        doc.set(Scope::Sanctuary, Some(ScopeConfig::new("https://s.example.com", "k", "m")));
        assert!(doc.get(Scope::Sanctuary).is_some());

        doc.set(Scope::Sanctuary, None);
        assert_eq!(doc.configured_count(), 0);
    }
}
