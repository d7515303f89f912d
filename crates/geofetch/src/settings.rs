//! Process-wide security configuration held as swappable snapshots.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::data::{ConfigOverride, RuntimeMode, SecurityConfig};
use crate::error::{FetchError, Result};

/// Active [`SecurityConfig`] plus the runtime mode it is judged against.
///
/// Readers take an `Arc` snapshot and keep it for the whole fetch, so a
/// concurrent reconfiguration never produces a half-updated view. Writers
/// are serialized so two overrides cannot lose each other's fields.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<SecurityConfig>,
    writer:  Mutex<()>,
    mode:    RuntimeMode,
}

impl ConfigStore {
    pub fn new(mode: RuntimeMode) -> Self {
        Self {
            current: ArcSwap::from_pointee(SecurityConfig::default()),
            writer: Mutex::new(()),
            mode,
        }
    }

    /// Start from `config` instead of the defaults.
    pub fn with_config(config: SecurityConfig, mode: RuntimeMode) -> Result<Self> {
        config.validate()?;
        let store = Self::new(mode);
        store.current.store(Arc::new(config));
        Ok(store)
    }

    pub fn mode(&self) -> RuntimeMode { self.mode }

    pub fn snapshot(&self) -> Arc<SecurityConfig> { self.current.load_full() }

    /// Merge `ov` into the active configuration and publish the result.
    ///
    /// The previous configuration stays active if the merged one is invalid.
    pub fn configure(&self, ov: &ConfigOverride) -> Result<Arc<SecurityConfig>> {
        let _writer = self.writer.lock();
        let next = self.current.load().apply(ov);
        self.publish(next)
    }

    /// Replace the active configuration wholesale.
    pub fn replace(&self, config: SecurityConfig) -> Result<Arc<SecurityConfig>> {
        let _writer = self.writer.lock();
        self.publish(config)
    }

    /// Relax HTTPS-only and allow plain HTTP to loopback.
    ///
    /// Refused with a configuration error in production.
    pub fn enable_development_mode(&self) -> Result<Arc<SecurityConfig>> {
        if self.mode.is_production() {
            warn!("refused to enable development mode in production");
            return Err(FetchError::configuration(
                "development mode cannot be enabled in production",
            ));
        }
        let config = self.configure(&ConfigOverride::development())?;
        warn!("development mode enabled: plain HTTP to localhost is permitted");
        Ok(config)
    }

    /// Restore the defaults.
    pub fn reset(&self) {
        let _writer = self.writer.lock();
        self.current.store(Arc::new(SecurityConfig::default()));
        info!("security configuration reset to defaults");
    }

    fn publish(&self, next: SecurityConfig) -> Result<Arc<SecurityConfig>> {
        next.validate()?;
        let next = Arc::new(next);
        self.current.store(Arc::clone(&next));
        info!(
            timeout_ms = next.timeout_ms,
            max_bytes = next.max_response_size_bytes,
            strict_https_only = next.strict_https_only,
            allow_http_localhost = next.allow_http_localhost,
            "security configuration updated"
        );
        Ok(next)
    }
}
