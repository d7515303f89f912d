//! Single-flight memoization of fetched documents.
//!
//! Entries are keyed by the exact URL string the caller supplied. While a
//! fetch runs, every caller for that key awaits the same spawned task; once
//! it succeeds the document is kept under the configured [`CachePolicy`].
//! Failures are never stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::GeographyDocument;
use crate::error::{FetchError, Result};

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<GeographyDocument>>>>;

/// Retention rules for resolved documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum resolved documents kept; least recently used go first.
    pub capacity: Option<usize>,
    /// Age after which a resolved document counts as a miss.
    pub ttl:      Option<Duration>,
}

impl CachePolicy {
    /// Keep everything for the life of the cache.
    pub fn unbounded() -> Self { Self::default() }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

enum Slot {
    Pending {
        id:      u64,
        fetch:   SharedFetch,
        waiters: usize,
        abort:   AbortHandle,
    },
    Ready {
        doc:       Arc<GeographyDocument>,
        stored_at: Instant,
        last_used: u64,
    },
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Slot>,
    policy:  CachePolicy,
    next_id: u64,
    clock:   u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn ready_count(&self) -> usize {
        self.entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    fn is_expired(&self, stored_at: Instant) -> bool {
        self.policy.ttl.is_some_and(|ttl| stored_at.elapsed() >= ttl)
    }

    /// Evict least recently used documents until one more fits.
    fn make_room(&mut self, capacity: usize) {
        while self.ready_count() >= capacity {
            let oldest = self
                .entries
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready { last_used, .. } => Some((*last_used, key.clone())),
                    Slot::Pending { .. } => None,
                })
                .min();
            match oldest {
                Some((_, key)) => {
                    debug!(url = %key, "evicting cached document");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Store the outcome of fetch `id` unless the entry was invalidated meanwhile.
    fn complete(&mut self, key: &str, id: u64, result: &Result<Arc<GeographyDocument>>) {
        if !matches!(self.entries.get(key), Some(Slot::Pending { id: current, .. }) if *current == id) {
            return;
        }
        self.entries.remove(key);
        let Ok(doc) = result else {
            return;
        };
        match self.policy.capacity {
            Some(0) => {}
            Some(capacity) => {
                self.make_room(capacity);
                self.insert_ready(key, doc);
            }
            None => self.insert_ready(key, doc),
        }
    }

    fn insert_ready(&mut self, key: &str, doc: &Arc<GeographyDocument>) {
        let last_used = self.tick();
        self.entries.insert(key.to_string(), Slot::Ready {
            doc: Arc::clone(doc),
            stored_at: Instant::now(),
            last_used,
        });
    }
}

/// Keeps one waiter registered on a pending fetch; the last one to leave
/// aborts the task.
struct WaitGuard {
    state: Arc<Mutex<CacheState>>,
    key:   String,
    id:    u64,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        let abandoned = match state.entries.get_mut(&self.key) {
            Some(Slot::Pending { id, waiters, abort, .. }) if *id == self.id => {
                *waiters -= 1;
                if *waiters == 0 {
                    abort.abort();
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if abandoned {
            debug!(url = %self.key, "all callers gone, fetch aborted");
            state.entries.remove(&self.key);
        }
    }
}

/// Request-deduplicating document cache. Cloning shares the same entries.
#[derive(Clone, Default)]
pub struct RequestCache {
    state: Arc<Mutex<CacheState>>,
}

impl RequestCache {
    pub fn new(policy: CachePolicy) -> Self {
        let cache = Self::default();
        cache.set_policy(policy);
        cache
    }

    pub fn policy(&self) -> CachePolicy { self.state.lock().policy }

    /// Change retention. Existing documents over capacity are evicted on the next store.
    pub fn set_policy(&self, policy: CachePolicy) { self.state.lock().policy = policy; }

    /// Return the cached document for `key`, or run `fetch` once for all
    /// concurrent callers of the same key.
    ///
    /// `fetch` runs in its own task, so one caller giving up does not fail
    /// the others. The task is aborted only when every caller has gone.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        cancel: Option<&CancellationToken>,
        fetch: F,
    ) -> Result<Arc<GeographyDocument>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GeographyDocument>> + Send + 'static,
    {
        let (shared, _guard) = {
            let mut state = self.state.lock();
            match self.join_or_start(&mut state, key, fetch) {
                Joined::Hit(doc) => return Ok(doc),
                Joined::Waiting { fetch, id } => (fetch, WaitGuard {
                    state: Arc::clone(&self.state),
                    key: key.to_string(),
                    id,
                }),
            }
        };

        match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(FetchError::load("request cancelled").with_url(key)),
                result = shared => result,
            },
            None => shared.await,
        }
    }

    fn join_or_start<F, Fut>(&self, state: &mut CacheState, key: &str, fetch: F) -> Joined
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GeographyDocument>> + Send + 'static,
    {
        let expired = match state.entries.get(key) {
            Some(Slot::Ready { stored_at, .. }) => state.is_expired(*stored_at),
            _ => false,
        };
        if expired {
            debug!(url = %key, "cached document expired");
            state.entries.remove(key);
        }

        let now = state.tick();
        match state.entries.get_mut(key) {
            Some(Slot::Ready { doc, last_used, .. }) => {
                *last_used = now;
                debug!(url = %key, "cache hit");
                return Joined::Hit(Arc::clone(doc));
            }
            Some(Slot::Pending { id, fetch, waiters, .. }) => {
                *waiters += 1;
                debug!(url = %key, waiters = *waiters, "joining in-flight fetch");
                return Joined::Waiting { fetch: fetch.clone(), id: *id };
            }
            None => {}
        }

        state.next_id += 1;
        let id = state.next_id;
        let owner = Arc::clone(&self.state);
        let owned_key = key.to_string();
        let work = fetch();
        let task = tokio::spawn(async move {
            let result = work.await.map(Arc::new);
            owner.lock().complete(&owned_key, id, &result);
            result
        });
        let abort = task.abort_handle();
        let shared = async move {
            task.await.unwrap_or_else(|e| {
                Err(FetchError::load("fetch task failed").with_source(e))
            })
        }
        .boxed()
        .shared();

        debug!(url = %key, "cache miss, starting fetch");
        state.entries.insert(key.to_string(), Slot::Pending {
            id,
            fetch: shared.clone(),
            waiters: 1,
            abort,
        });
        Joined::Waiting { fetch: shared, id }
    }

    /// Forget `key`. A fetch already running still answers its callers but
    /// its result is not stored.
    pub fn invalidate(&self, key: &str) -> bool { self.state.lock().entries.remove(key).is_some() }

    pub fn clear(&self) { self.state.lock().entries.clear(); }

    /// Number of resolved documents held.
    pub fn len(&self) -> usize { self.state.lock().ready_count() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Number of fetches currently running.
    pub fn in_flight(&self) -> usize {
        let state = self.state.lock();
        state.entries.len() - state.ready_count()
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.state.lock().entries.get(key), Some(Slot::Ready { .. }))
    }
}

enum Joined {
    Hit(Arc<GeographyDocument>),
    Waiting { fetch: SharedFetch, id: u64 },
}
