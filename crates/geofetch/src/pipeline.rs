//! The consumer-facing entry point tying every stage together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::parse_document;
use crate::data::{ConfigOverride, GeographyDocument, RuntimeMode, SecurityConfig, SriPolicy};
use crate::effects::{CachePolicy, Fetcher, HttpClient, RequestCache};
use crate::error::{FetchError, Result};
use crate::registry::IntegrityRegistry;
use crate::settings::ConfigStore;

#[cfg(feature = "reqwest")]
use crate::effects::ReqwestClient;

struct Inner<C: HttpClient> {
    fetcher:  Fetcher<C>,
    settings: ConfigStore,
    registry: IntegrityRegistry,
    cache:    RequestCache,
}

/// Secure geography loader.
///
/// Cheap to clone; clones share configuration, integrity records and cache.
pub struct GeoFetcher<C: HttpClient> {
    inner: Arc<Inner<C>>,
}

impl<C: HttpClient> Clone for GeoFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "reqwest")]
impl GeoFetcher<ReqwestClient> {
    /// Loader backed by reqwest with default configuration.
    pub fn new(mode: RuntimeMode) -> Result<Self> {
        Ok(Self::with_client(ReqwestClient::new()?, mode))
    }
}

impl<C: HttpClient + 'static> GeoFetcher<C> {
    pub fn with_client(client: C, mode: RuntimeMode) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher:  Fetcher::new(client),
                settings: ConfigStore::new(mode),
                registry: IntegrityRegistry::default(),
                cache:    RequestCache::default(),
            }),
        }
    }

    /// Replace the starting configuration.
    pub fn with_config(self, config: SecurityConfig) -> Result<Self> {
        self.inner.settings.replace(config)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_sri_policy(self, policy: SriPolicy) -> Self {
        self.inner.registry.replace(policy);
        self
    }

    #[must_use]
    pub fn with_cache_policy(self, policy: CachePolicy) -> Self {
        self.inner.cache.set_policy(policy);
        self
    }

    pub fn mode(&self) -> RuntimeMode { self.inner.settings.mode() }

    /// The configuration a fetch starting now would use.
    pub fn config(&self) -> Arc<SecurityConfig> { self.inner.settings.snapshot() }

    pub fn registry(&self) -> &IntegrityRegistry { &self.inner.registry }

    pub fn cache(&self) -> &RequestCache { &self.inner.cache }

    pub fn client(&self) -> &C { self.inner.fetcher.client() }

    /// Apply a partial configuration override.
    pub fn configure(&self, ov: &ConfigOverride) -> Result<Arc<SecurityConfig>> {
        self.inner.settings.configure(ov)
    }

    /// Allow plain HTTP to loopback. Refused in production.
    pub fn enable_development_mode(&self) -> Result<Arc<SecurityConfig>> {
        self.inner.settings.enable_development_mode()
    }

    /// Preflight check of `url` against the active policy. No network I/O.
    pub fn validate_url(&self, url: &str) -> Result<()> {
        let config = self.inner.settings.snapshot();
        crate::core::validate_url(url, &config, self.mode()).map(drop)
    }

    /// Run the full pipeline for `url`, bypassing the cache.
    pub async fn fetch_document(&self, url: &str) -> Result<GeographyDocument> {
        self.inner.run(url).await
    }

    /// Memoized fetch. Concurrent calls for the same URL string share one
    /// network fetch; failures are not remembered.
    pub async fn get_or_fetch(&self, url: &str) -> Result<Arc<GeographyDocument>> {
        self.cached(url, None).await
    }

    /// As [`get_or_fetch`](Self::get_or_fetch), but gives up when `cancel` fires.
    pub async fn get_or_fetch_with_cancel(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<Arc<GeographyDocument>> {
        self.cached(url, Some(&cancel)).await
    }

    async fn cached(
        &self,
        url: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Arc<GeographyDocument>> {
        let inner = Arc::clone(&self.inner);
        let owned = url.to_string();
        self.inner
            .cache
            .get_or_fetch(url, cancel, move || async move { inner.run(&owned).await })
            .await
    }
}

impl<C: HttpClient> Inner<C> {
    async fn run(&self, url: &str) -> Result<GeographyDocument> {
        // One snapshot for every hop of this fetch.
        let config = self.settings.snapshot();
        let mode = self.settings.mode();

        match tokio::time::timeout(config.timeout(), self.pipeline(url, &config, mode)).await {
            Ok(result) => result.map_err(|e| e.or_url(url)),
            Err(elapsed) => Err(FetchError::load(format!(
                "request timed out after {} ms",
                config.timeout_ms
            ))
            .with_url(url)
            .with_source(elapsed)),
        }
    }

    async fn pipeline(
        &self,
        url: &str,
        config: &SecurityConfig,
        mode: RuntimeMode,
    ) -> Result<GeographyDocument> {
        let target = crate::core::validate_url(url, config, mode)?;

        let plan = self.registry.plan(url);
        let mut verifier = plan.verifier();

        debug!(url = %target, verified = verifier.is_some(), "fetching geography");
        let body = self.fetcher.fetch(target, config, mode, verifier.as_mut()).await?;
        plan.conclude(verifier, url)?;

        let doc = parse_document(&body)?;
        info!(url, kind = %doc.kind(), bytes = body.len(), "geography loaded");
        Ok(doc)
    }
}
