use std::collections::HashMap;

use geofetch_verify::{Algorithm, Integrity};

use crate::error::{FetchError, Result};

/// A known digest for one source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SriRecord {
    pub integrity: Integrity,
    /// Whether a mismatch blocks delivery when known sources are enforced.
    pub enforce:   bool,
}

impl SriRecord {
    pub fn new(integrity: Integrity, enforce: bool) -> Self { Self { integrity, enforce } }

    /// Parse an SRI token such as `sha384-<base64>`.
    pub fn parse(token: &str, enforce: bool) -> Result<Self> {
        let integrity = token.parse().map_err(FetchError::from_verification)?;
        Ok(Self::new(integrity, enforce))
    }

    pub fn algorithm(&self) -> Algorithm { self.integrity.algorithm() }

    /// Base64 digest value.
    pub fn digest_value(&self) -> String { self.integrity.digest_base64() }
}

/// How integrity records are enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SriPolicy {
    /// Verify records marked `enforce` and fail on mismatch.
    pub enforce_known: bool,
    /// Verify every record regardless of its flag.
    pub enforce_all:   bool,
    /// With `enforce_all`, whether sources without a record may still load.
    pub allow_unknown: bool,
    /// Records keyed by canonical URL (raw keys are tolerated on lookup).
    pub records:       HashMap<String, SriRecord>,
}

impl Default for SriPolicy {
    fn default() -> Self {
        Self {
            enforce_known: true,
            enforce_all:   false,
            allow_unknown: true,
            records:       HashMap::new(),
        }
    }
}

impl SriPolicy {
    /// Require a matching record for every source.
    pub fn strict() -> Self {
        Self {
            enforce_all: true,
            allow_unknown: false,
            ..Self::default()
        }
    }

    /// Verify nothing strictly; mismatches are only logged.
    pub fn permissive() -> Self {
        Self {
            enforce_known: false,
            enforce_all: false,
            allow_unknown: true,
            ..Self::default()
        }
    }

    pub fn requires_integrity_for_all(&self) -> bool { self.enforce_all && !self.allow_unknown }
}
