use std::time::Duration;

use serde::Deserialize;

use crate::domain::Scope;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub router: RouterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Scope routing settings
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Lifetime of cached scope config lookups
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Scoped calls slower than this are logged at warn
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    /// JSON file backing the document store; in-memory when unset
    #[serde(default)]
    pub store_path: Option<String>,
    #[serde(default)]
    pub default_scope: Scope,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_slow_threshold_ms() -> u64 {
    1000
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            slow_threshold_ms: default_slow_threshold_ms(),
            store_path: None,
            default_scope: Scope::DEFAULT,
        }
    }
}

impl RouterConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.router.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.router.slow_threshold(), Duration::from_millis(1000));
        assert_eq!(config.router.default_scope, Scope::RealWorld);
        assert!(config.router.store_path.is_none());
    }

    #[test]
    fn test_partial_router_section() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "logging": {"level": "debug", "format": "json"},
            "router": {"cache_ttl_secs": 30, "default_scope": "sanctuary"}
        }))
        .unwrap();

        assert!(matches!(config.logging.format, LogFormat::Json));
        assert_eq!(config.router.cache_ttl_secs, 30);
        assert_eq!(config.router.slow_threshold_ms, 1000);
        assert_eq!(config.router.default_scope, Scope::Sanctuary);
    }
}
