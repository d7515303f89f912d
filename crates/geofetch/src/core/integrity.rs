//! Deciding how a source's integrity is checked.

use geofetch_verify::{Integrity, Verifier};
use tracing::warn;

use super::canonical::canonical_url;
use crate::data::{SriPolicy, SriRecord};
use crate::error::{FetchError, Result, SecurityReason};

/// What the pipeline must do with the digest of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityPlan {
    /// No record and none required.
    Unchecked,
    /// A mismatch fails the fetch.
    Enforced(Integrity),
    /// A mismatch is logged and the document still delivered.
    Advisory(Integrity),
    /// Every source needs a record and this one has none.
    Missing,
}

impl IntegrityPlan {
    /// A streaming verifier when there is a digest to compare against.
    pub fn verifier(&self) -> Option<Verifier> {
        match self {
            Self::Enforced(integrity) | Self::Advisory(integrity) => Some(integrity.verifier()),
            Self::Unchecked | Self::Missing => None,
        }
    }

    /// Resolve the outcome once the whole body has been fed to `verifier`.
    ///
    /// A source with no record under a require-all policy fails here, after
    /// the body was read, like any other digest failure.
    pub fn conclude(&self, verifier: Option<Verifier>, url: &str) -> Result<()> {
        if matches!(self, Self::Missing) {
            return Err(FetchError::security(
                SecurityReason::IntegrityRequired,
                "integrity record required for this source",
            )
            .with_url(url));
        }
        let Some(verifier) = verifier else {
            return Ok(());
        };
        match (self, verifier.finish()) {
            (_, Ok(())) => Ok(()),
            (Self::Advisory(_), Err(err)) => {
                warn!(url, error = %err, "integrity mismatch on advisory record");
                Ok(())
            }
            (_, Err(err)) => Err(FetchError::from_verification(err).with_url(url)),
        }
    }
}

/// Find the record for `url`: canonical form first, then the raw string.
pub fn lookup<'a>(policy: &'a SriPolicy, url: &str) -> Option<&'a SriRecord> {
    canonical_url(url)
        .and_then(|key| policy.records.get(&key))
        .or_else(|| policy.records.get(url))
}

pub fn plan(policy: &SriPolicy, url: &str) -> IntegrityPlan {
    match lookup(policy, url) {
        Some(record) if policy.enforce_all || (policy.enforce_known && record.enforce) => {
            IntegrityPlan::Enforced(record.integrity.clone())
        }
        Some(record) => IntegrityPlan::Advisory(record.integrity.clone()),
        None if policy.requires_integrity_for_all() => IntegrityPlan::Missing,
        None => IntegrityPlan::Unchecked,
    }
}
