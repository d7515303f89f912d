//! Known-source integrity records and their enforcement policy.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::core::{IntegrityPlan, canonical_url, lookup_integrity, plan_integrity};
use crate::data::{SriPolicy, SriRecord};
use crate::error::Result;

/// Shared handle to the active [`SriPolicy`]. Clones see the same policy.
#[derive(Debug, Clone, Default)]
pub struct IntegrityRegistry {
    policy: Arc<ArcSwap<SriPolicy>>,
}

impl IntegrityRegistry {
    pub fn new(policy: SriPolicy) -> Self {
        Self {
            policy: Arc::new(ArcSwap::from_pointee(policy)),
        }
    }

    /// Default enforcement seeded with `records`, keyed by URL.
    pub fn with_records(records: impl IntoIterator<Item = (String, SriRecord)>) -> Self {
        let records = records
            .into_iter()
            .map(|(url, record)| (canonical_key(&url), record))
            .collect::<HashMap<_, _>>();
        Self::new(SriPolicy {
            records,
            ..SriPolicy::default()
        })
    }

    pub fn snapshot(&self) -> Arc<SriPolicy> { self.policy.load_full() }

    /// Swap in a whole new policy.
    pub fn replace(&self, policy: SriPolicy) {
        self.policy.store(Arc::new(policy));
        info!("integrity policy replaced");
    }

    fn update(&self, f: impl Fn(&mut SriPolicy)) {
        self.policy.rcu(|current| {
            let mut next = SriPolicy::clone(current);
            f(&mut next);
            next
        });
    }

    /// Register a digest for `url`. The key is canonicalized.
    pub fn add_record(&self, url: &str, record: SriRecord) {
        let key = canonical_key(url);
        info!(url = %key, algorithm = %record.algorithm(), enforce = record.enforce, "integrity record added");
        self.update(|policy| {
            policy.records.insert(key.clone(), record.clone());
        });
    }

    /// Parse an SRI token and register it for `url`.
    pub fn add_sri(&self, url: &str, token: &str, enforce: bool) -> Result<()> {
        let record = SriRecord::parse(token, enforce)?;
        self.add_record(url, record);
        Ok(())
    }

    pub fn remove_record(&self, url: &str) -> bool {
        let key = canonical_key(url);
        let mut removed = false;
        self.policy.rcu(|current| {
            let mut next = SriPolicy::clone(current);
            removed = next.records.remove(&key).is_some();
            next
        });
        removed
    }

    pub fn get_record(&self, url: &str) -> Option<SriRecord> {
        lookup_integrity(&self.policy.load(), url).cloned()
    }

    /// Every source must have a matching record.
    pub fn enable_strict(&self) { self.enable_strict_enforcement(false); }

    /// Verify every known record; `allow_unknown` decides whether sources
    /// without a record may still load.
    pub fn enable_strict_enforcement(&self, allow_unknown: bool) {
        self.update(|policy| {
            policy.enforce_known = true;
            policy.enforce_all = true;
            policy.allow_unknown = allow_unknown;
        });
        info!(allow_unknown, "strict integrity enforcement enabled");
    }

    /// Stop failing on mismatches. Records are kept and still checked
    /// advisorily.
    pub fn disable_enforcement(&self) {
        self.update(|policy| {
            policy.enforce_known = false;
            policy.enforce_all = false;
            policy.allow_unknown = true;
        });
        warn!("integrity enforcement disabled, mismatches will only be logged");
    }

    pub fn plan(&self, url: &str) -> IntegrityPlan { plan_integrity(&self.policy.load(), url) }
}

fn canonical_key(url: &str) -> String { canonical_url(url).unwrap_or_else(|| url.to_string()) }
