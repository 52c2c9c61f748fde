//! Builder for configuring cache instances

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use super::EmbeddedCache;
use super::interceptor::RequestInterceptor;
use super::lifecycle::{DEFAULT_INSTALL_CONCURRENCY, GenerationManager};
use super::routing::{PolicyClassifier, PolicyConfig};
use super::strategy::StrategyEngine;
use crate::cache::{CacheService, ExpiryScanner, MemoryStorage, ScanConfig};
use crate::network::{FetchConfig, Fetcher, HttpFetcher};
use crate::types::Manifest;
use crate::{DEFAULT_CACHE_VERSION, HoardError, Result};

/// Default generation name prefix.
pub const DEFAULT_PREFIX: &str = "loza-games";

/// Default offline document path.
pub const DEFAULT_OFFLINE_DOCUMENT: &str = "/offline.html";

/// Main entry point for creating cache instances.
pub struct Hoard;

impl Hoard {
    /// Create a new builder for configuring the cache.
    pub fn builder() -> HoardBuilder {
        HoardBuilder::new()
    }
}

/// Builder for configuring cache instances.
pub struct HoardBuilder {
    origin: Option<String>,
    fetcher: Option<Arc<dyn Fetcher>>,
    service: Option<Arc<CacheService>>,
    version: String,
    prefix: String,
    manifest: Manifest,
    offline_document: String,
    precache_offline_document: bool,
    fetch_config: FetchConfig,
    policy: PolicyConfig,
    scan: ScanConfig,
    install_concurrency: usize,
}

impl HoardBuilder {
    pub fn new() -> Self {
        Self {
            origin: None,
            fetcher: None,
            service: None,
            version: DEFAULT_CACHE_VERSION.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            manifest: Manifest::default(),
            offline_document: DEFAULT_OFFLINE_DOCUMENT.to_string(),
            precache_offline_document: true,
            fetch_config: FetchConfig::default(),
            policy: PolicyConfig::default(),
            scan: ScanConfig::default(),
            install_concurrency: DEFAULT_INSTALL_CONCURRENCY,
        }
    }

    /// Origin the manifest and offline document resolve against (required).
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Use a custom network capability instead of [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Attach to an existing [`CacheService`] instead of a fresh
    /// [`MemoryStorage`].
    ///
    /// Instances for successive deployment versions must share one service
    /// so their installs and activations are serialized and activation
    /// switches every instance's clients.
    pub fn service(mut self, service: Arc<CacheService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Deployment version tag embedded in the generation name.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Generation name prefix (default: `loza-games`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Path of the document served to page loads that fail with nothing
    /// cached (default: `/offline.html`).
    pub fn offline_document(mut self, path: impl Into<String>) -> Self {
        self.offline_document = path.into();
        self
    }

    /// Add the offline document to the shell when the manifest lacks it
    /// (default: on).
    pub fn precache_offline_document(mut self, enabled: bool) -> Self {
        self.precache_offline_document = enabled;
        self
    }

    pub fn fetch_config(mut self, config: FetchConfig) -> Self {
        self.fetch_config = config;
        self
    }

    /// Bound on every network fetch (default: 20s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.fetch_config.timeout = timeout;
        self
    }

    pub fn policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Manifest fetches in flight during install (default: 6).
    pub fn install_concurrency(mut self, n: usize) -> Self {
        self.install_concurrency = n;
        self
    }

    /// Build the cache.
    pub fn build(self) -> Result<EmbeddedCache> {
        let origin = self
            .origin
            .as_deref()
            .ok_or_else(|| HoardError::Configuration("origin is required".into()))?;
        let origin = Url::parse(origin)
            .map_err(|e| HoardError::Configuration(format!("invalid origin {origin:?}: {e}")))?;
        let offline_url = origin.join(&self.offline_document).map_err(|e| {
            HoardError::Configuration(format!(
                "invalid offline document {:?}: {e}",
                self.offline_document
            ))
        })?;

        if self.scan.interval.is_zero() {
            return Err(HoardError::Configuration(
                "scan interval must be greater than zero".into(),
            ));
        }

        let classifier = PolicyClassifier::new(&self.policy)?;

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(origin.clone(), &self.fetch_config)?),
        };
        let service = self
            .service
            .unwrap_or_else(|| Arc::new(CacheService::new(Arc::new(MemoryStorage::new()))));
        let timeout = self.fetch_config.timeout;

        let mut manifest = self.manifest;
        if self.precache_offline_document && !manifest.shell.contains(&self.offline_document) {
            manifest.shell.push(self.offline_document.clone());
        }

        let engine = StrategyEngine::new(service.clone(), fetcher.clone(), timeout);
        let interceptor =
            RequestInterceptor::new(classifier, engine, service.clone(), offline_url);
        let lifecycle = GenerationManager::new(
            service.clone(),
            fetcher,
            origin,
            manifest,
            self.prefix,
            self.version,
            timeout,
            self.install_concurrency,
        );
        let scanner = Arc::new(ExpiryScanner::new(service.clone(), self.scan));

        Ok(EmbeddedCache::new(service, interceptor, lifecycle, scanner))
    }
}

impl Default for HoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
