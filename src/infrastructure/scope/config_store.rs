use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::domain::redact::RedactedConfig;
use crate::domain::scope_config::{describe_errors, validate_scope_config};
use crate::domain::{Notifier, NotifyLevel, Scope, ScopeConfig, ScopeConfigSource};

/// Default lifetime of a cached lookup
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Cached lookup result; `config: None` is a cached "use host default"
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub config: Option<ScopeConfig>,
    pub loaded_at: Instant,
}

impl CacheEntry {
    fn new(config: Option<ScopeConfig>) -> Self {
        Self {
            config,
            loaded_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

/// Scope to config resolution with TTL caching of hits and misses
pub struct ConfigStore {
    source: Arc<dyn ScopeConfigSource>,
    cache: Cache<Scope, Arc<CacheEntry>>,
    ttl: Duration,
    notifier: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    pub fn new(source: Arc<dyn ScopeConfigSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(Scope::ALL.len() as u64)
            .build();

        Self {
            source,
            cache,
            ttl,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolves a scope to its config, `None` meaning the host default backend.
    ///
    /// Load and validation failures resolve to `None` and are cached like any
    /// other result, so they are reported once per TTL window.
    pub async fn get(&self, scope: Scope) -> Option<ScopeConfig> {
        if let Some(entry) = self.cache.get(&scope).await {
            if entry.is_fresh(self.ttl) {
                debug!(scope = %scope, custom = entry.config.is_some(), "Config cache hit");
                return entry.config.clone();
            }

            self.cache.invalidate(&scope).await;
        }

        let entry = self
            .cache
            .get_with(scope, async { Arc::new(CacheEntry::new(self.load(scope).await)) })
            .await;

        entry.config.clone()
    }

    /// Returns the cached entry without loading
    pub async fn cached(&self, scope: Scope) -> Option<Arc<CacheEntry>> {
        self.cache
            .get(&scope)
            .await
            .filter(|entry| entry.is_fresh(self.ttl))
    }

    /// Drops one cached scope, or every scope when `None`
    pub async fn invalidate(&self, scope: Option<Scope>) {
        match scope {
            Some(scope) => {
                self.cache.invalidate(&scope).await;
                debug!(scope = %scope, "Config cache entry invalidated");
            }
            None => {
                self.cache.invalidate_all();
                debug!("Config cache cleared");
            }
        }
    }

    /// Loads every scope into the cache, returns how many use a custom backend
    pub async fn preload(&self) -> usize {
        let results = join_all(Scope::ALL.iter().map(|scope| self.get(*scope))).await;
        let custom = results.iter().filter(|config| config.is_some()).count();

        info!(scopes = Scope::ALL.len(), custom, "Scope configs preloaded");
        custom
    }

    async fn load(&self, scope: Scope) -> Option<ScopeConfig> {
        debug!(scope = %scope, "Config cache miss, loading");

        let config = match self.source.load(scope).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!(scope = %scope, "No custom config, using host default backend");
                return None;
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "Failed to load scope config, using host default backend");
                self.notify(
                    NotifyLevel::Warn,
                    &format!(
                        "Could not load the {} backend config, using the default backend",
                        scope.display_name()
                    ),
                );
                return None;
            }
        };

        if let Err(errors) = validate_scope_config(&config) {
            warn!(
                scope = %scope,
                problems = %describe_errors(&errors),
                "Stored scope config is invalid, using host default backend"
            );
            self.notify(
                NotifyLevel::Warn,
                &format!(
                    "The {} backend config is invalid ({}), using the default backend",
                    scope.display_name(),
                    describe_errors(&errors)
                ),
            );
            return None;
        }

        info!(scope = %scope, config = %RedactedConfig(&config), "Custom config loaded");
        Some(config)
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::host::RecordingNotifier;
    use crate::domain::scope_config::MockScopeConfigSource;
    use crate::domain::{DomainError, MultiScopeConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        configs: MultiScopeConfig,
        call_count: AtomicUsize,
    }

    impl CountingSource {
        fn new(configs: MultiScopeConfig) -> Self {
            Self {
                configs,
                call_count: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScopeConfigSource for CountingSource {
        async fn load(&self, scope: Scope) -> Result<Option<ScopeConfig>, DomainError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.configs.get(scope).cloned())
        }
    }

    fn inner_config() -> ScopeConfig {
        ScopeConfig::new("https://inner.example.com/v1", "sk-inner-123456789", "creative")
    }

    #[tokio::test]
    async fn test_loader_called_once_within_ttl() {
        let source = Arc::new(CountingSource::new(
            MultiScopeConfig::default().with(Scope::InnerWorld, inner_config()),
        ));
        let store = ConfigStore::new(source.clone(), Duration::from_secs(60));

        assert_eq!(store.get(Scope::InnerWorld).await, Some(inner_config()));
        assert_eq!(store.get(Scope::InnerWorld).await, Some(inner_config()));

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_loader_called_again_after_expiry() {
        let source = Arc::new(CountingSource::new(
            MultiScopeConfig::default().with(Scope::InnerWorld, inner_config()),
        ));
        let store = ConfigStore::new(source.clone(), Duration::from_millis(100));

        store.get(Scope::InnerWorld).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.get(Scope::InnerWorld).await;

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_absent_config_is_cached() {
        let source = Arc::new(CountingSource::new(MultiScopeConfig::default()));
        let store = ConfigStore::new(source.clone(), Duration::from_secs(60));

        assert_eq!(store.get(Scope::Sanctuary).await, None);
        assert_eq!(store.get(Scope::Sanctuary).await, None);

        assert_eq!(source.calls(), 1);
        let entry = store.cached(Scope::Sanctuary).await.unwrap();
        assert!(entry.config.is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_resolves_absent_and_warns_once() {
        let invalid = ScopeConfig::new("api.example.com", "", "m").with_temperature(2.5);
        let source = Arc::new(CountingSource::new(
            MultiScopeConfig::default().with(Scope::RealWorld, invalid),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let store = ConfigStore::new(source.clone(), Duration::from_secs(60))
            .with_notifier(notifier.clone());

        assert_eq!(store.get(Scope::RealWorld).await, None);
        assert_eq!(store.get(Scope::RealWorld).await, None);

        assert_eq!(source.calls(), 1);
        assert_eq!(notifier.count(NotifyLevel::Warn), 1);
    }

    #[tokio::test]
    async fn test_loopback_endpoint_needs_no_credential() {
        let local = ScopeConfig::new("http://127.0.0.1:5001/v1", "", "local-model");
        let source = Arc::new(CountingSource::new(
            MultiScopeConfig::default().with(Scope::Sanctuary, local.clone()),
        ));
        let store = ConfigStore::new(source, Duration::from_secs(60));

        assert_eq!(store.get(Scope::Sanctuary).await, Some(local));
    }

    #[tokio::test]
    async fn test_invalidate_one_and_all() {
        let source = Arc::new(CountingSource::new(MultiScopeConfig::default()));
        let store = ConfigStore::new(source.clone(), Duration::from_secs(60));

        store.get(Scope::RealWorld).await;
        store.get(Scope::InnerWorld).await;

        store.invalidate(Some(Scope::RealWorld)).await;
        store.get(Scope::RealWorld).await;
        store.get(Scope::InnerWorld).await;
        assert_eq!(source.calls(), 3);

        store.invalidate(None).await;
        store.get(Scope::RealWorld).await;
        store.get(Scope::InnerWorld).await;
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_preload_with_stored_document_isolates_bad_record() {
        use crate::domain::storage::API_CONFIGS_KEY;
        use crate::infrastructure::services::ScopeConfigService;
        use crate::infrastructure::storage::InMemoryDocumentStore;

        let document = serde_json::json!({
            "realWorld": {"apiurl": "https://real.example.com/v1", "key": "sk-real-123456789", "model": "real-model"},
            "innerWorld": {"apiurl": "https://inner.example.com/v1", "key": "sk-inner-123456789"},
            "sanctuary": null
        });
        let service = ScopeConfigService::new(Arc::new(InMemoryDocumentStore::with_documents(
            vec![(API_CONFIGS_KEY.to_string(), document)],
        )));
        let notifier = Arc::new(RecordingNotifier::new());
        let store = ConfigStore::new(Arc::new(service), Duration::from_secs(60))
            .with_notifier(notifier.clone());

        assert_eq!(store.preload().await, 1);
        assert_eq!(
            store.get(Scope::RealWorld).await.map(|c| c.model),
            Some("real-model".to_string())
        );
        assert_eq!(store.get(Scope::InnerWorld).await, None);

        let warnings = notifier.messages();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].1.contains("invalid"));
        assert!(warnings[0].1.contains("Model name cannot be empty"));
    }

    #[tokio::test]
    async fn test_preload_isolates_failures() {
        let mut source = MockScopeConfigSource::new();
        source
            .expect_load()
            .withf(|scope| *scope == Scope::InnerWorld)
            .times(1)
            .returning(|_| Err(DomainError::storage("document unreadable")));
        source
            .expect_load()
            .withf(|scope| *scope == Scope::RealWorld)
            .times(1)
            .returning(|_| Ok(Some(inner_config())));
        source
            .expect_load()
            .withf(|scope| *scope == Scope::Sanctuary)
            .times(1)
            .returning(|_| Ok(None));

        let notifier = Arc::new(RecordingNotifier::new());
        let store = ConfigStore::new(Arc::new(source), Duration::from_secs(60))
            .with_notifier(notifier.clone());

        assert_eq!(store.preload().await, 1);

        // served from cache, the mock would panic on a second load
        assert_eq!(store.get(Scope::RealWorld).await, Some(inner_config()));
        assert_eq!(store.get(Scope::InnerWorld).await, None);
        assert_eq!(notifier.count(NotifyLevel::Warn), 1);
    }
}
