use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};

/// Environment variable read by [`RuntimeMode::from_env`].
pub const RUNTIME_MODE_ENV: &str = "GEOFETCH_ENV";

/// Runtime mode supplied by the host application at startup.
///
/// The validator never looks this up on its own; it is passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    Test,
    #[default]
    Production,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool { self == Self::Production }

    /// Read [`RUNTIME_MODE_ENV`]. Unset or unrecognised values mean production.
    pub fn from_env() -> Self {
        std::env::var(RUNTIME_MODE_ENV)
            .map(|value| Self::from_name(&value))
            .unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "test" => Self::Test,
            _ => Self::Production,
        }
    }
}

/// Network and content policy applied to every fetch.
///
/// Instances are immutable once published; reconfiguration builds a new
/// value and swaps it in whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bound on the whole fetch: every redirect hop plus the body read.
    pub timeout_ms: u64,

    /// Hard ceiling on received body bytes, independent of `Content-Length`.
    pub max_response_size_bytes: u64,

    /// Content types accepted by case-insensitive substring match.
    pub allowed_content_types: BTreeSet<String>,

    /// URL schemes accepted when `strict_https_only` is off.
    pub allowed_protocols: BTreeSet<String>,

    /// Permit plain HTTP to `localhost`, `127.0.0.1` and `::1` outside production.
    pub allow_http_localhost: bool,

    /// Only `https` passes; `allowed_protocols` is ignored.
    pub strict_https_only: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            timeout_ms:              10_000,
            max_response_size_bytes: 10 * 1024 * 1024,
            allowed_content_types:   [
                "application/json",
                "application/geo+json",
                "application/vnd.geo+json",
                "application/topo+json",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            allowed_protocols:       BTreeSet::from(["https".to_string()]),
            allow_http_localhost:    false,
            strict_https_only:       true,
        }
    }
}

impl SecurityConfig {
    /// Defaults relaxed for local development: HTTP to loopback is allowed.
    pub fn development() -> Self { Self::default().apply(&ConfigOverride::development()) }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }

    /// Whether `scheme` passes the protocol policy.
    pub fn allows_protocol(&self, scheme: &str) -> bool {
        let scheme = normalize_protocol(scheme);
        if self.strict_https_only {
            return scheme == "https";
        }
        self.allowed_protocols
            .iter()
            .any(|allowed| normalize_protocol(allowed) == scheme)
    }

    /// Return a copy with every field present in `ov` replaced.
    #[must_use]
    pub fn apply(&self, ov: &ConfigOverride) -> Self {
        let mut next = self.clone();
        if let Some(timeout_ms) = ov.timeout_ms {
            next.timeout_ms = timeout_ms;
        }
        if let Some(max) = ov.max_response_size_bytes {
            next.max_response_size_bytes = max;
        }
        if let Some(types) = &ov.allowed_content_types {
            next.allowed_content_types = types.clone();
        }
        if let Some(protocols) = &ov.allowed_protocols {
            next.allowed_protocols = protocols.clone();
        }
        if let Some(allow) = ov.allow_http_localhost {
            next.allow_http_localhost = allow;
        }
        if let Some(strict) = ov.strict_https_only {
            next.strict_https_only = strict;
        }
        next
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(FetchError::configuration("timeout_ms must be greater than zero"));
        }
        if self.max_response_size_bytes == 0 {
            return Err(FetchError::configuration(
                "max_response_size_bytes must be greater than zero",
            ));
        }
        if self.allowed_content_types.iter().all(|t| t.trim().is_empty()) {
            return Err(FetchError::configuration("allowed_content_types must not be empty"));
        }
        if !self.strict_https_only && self.allowed_protocols.is_empty() {
            return Err(FetchError::configuration("allowed_protocols must not be empty"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing fields take defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|e| {
            FetchError::configuration(format!("invalid configuration: {e}")).with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            FetchError::configuration(format!("invalid configuration: {e}")).with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }
}

fn normalize_protocol(protocol: &str) -> String {
    protocol.trim().trim_end_matches(':').to_ascii_lowercase()
}

/// Partial update of [`SecurityConfig`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    pub timeout_ms:              Option<u64>,
    pub max_response_size_bytes: Option<u64>,
    pub allowed_content_types:   Option<BTreeSet<String>>,
    pub allowed_protocols:       Option<BTreeSet<String>>,
    pub allow_http_localhost:    Option<bool>,
    pub strict_https_only:       Option<bool>,
}

impl ConfigOverride {
    /// The relaxation applied by the development-mode toggle.
    pub fn development() -> Self {
        Self {
            allowed_protocols: Some(BTreeSet::from(["https".to_string(), "http".to_string()])),
            allow_http_localhost: Some(true),
            strict_https_only: Some(false),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn max_response_size_bytes(mut self, max: u64) -> Self {
        self.max_response_size_bytes = Some(max);
        self
    }

    #[must_use]
    pub fn allowed_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_content_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn allowed_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_protocols = Some(protocols.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn allow_http_localhost(mut self, allow: bool) -> Self {
        self.allow_http_localhost = Some(allow);
        self
    }

    #[must_use]
    pub fn strict_https_only(mut self, strict: bool) -> Self {
        self.strict_https_only = Some(strict);
        self
    }
}
