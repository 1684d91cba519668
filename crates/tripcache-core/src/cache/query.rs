use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use super::entry::CachedData;
use super::key::{QueryData, QueryKey};
use crate::api::StoreResult;

/// How long a fetched value counts as fresh by default.
const DEFAULT_STALE_MINUTES: u64 = 5;

/// A pending fetch handed to the cache. It must not borrow anything, since
/// it may outlive the caller that started it.
pub type FetchFuture = BoxFuture<'static, StoreResult<QueryData>>;

type SharedFetch = Shared<FetchFuture>;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Values younger than this are served without re-fetching.
    pub stale_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(DEFAULT_STALE_MINUTES * 60),
        }
    }
}

impl CacheConfig {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }
}

/// What a background fetch request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// The cached value is fresh; nothing was fetched.
    Fresh,
    /// A fetch for the key was already pending and is left to finish.
    InFlight,
    /// A new fetch was spawned.
    Started,
}

struct InFlight {
    seq: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CachedData<QueryData>>,
    in_flight: HashMap<QueryKey, InFlight>,
    /// Sequence number of the last write to each key, fetched or local.
    /// Removed keys keep their number so late fetches stay discarded.
    last_write: HashMap<QueryKey, u64>,
    next_seq: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn record_write(&mut self, key: &QueryKey) {
        let seq = self.next_seq();
        self.last_write.insert(key.clone(), seq);
    }
}

enum ReadPlan {
    Hit(QueryData),
    Revalidate(QueryData, Option<SharedFetch>),
    Wait(SharedFetch),
}

/// Keyed cache of query results.
///
/// Clone is cheap: clones share the same underlying state. All operations
/// take the lock briefly and never hold it across an `.await`, so each one is
/// atomic with respect to the others.
#[derive(Clone)]
pub struct EntityCache {
    state: Arc<Mutex<CacheState>>,
    config: CacheConfig,
    ttl: chrono::Duration,
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl EntityCache {
    pub fn new(config: CacheConfig) -> Self {
        let ttl = chrono::Duration::from_std(config.stale_time)
            .unwrap_or_else(|_| chrono::Duration::weeks(52));
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            config,
            ttl,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Direct access =====

    /// The cached value for `key`, fresh or not
    pub fn get(&self, key: &QueryKey) -> Option<QueryData> {
        self.lock().entries.get(key).map(|e| e.data.clone())
    }

    /// Replace the value for `key` and restart its freshness window
    pub fn set(&self, key: QueryKey, value: QueryData) {
        let mut state = self.lock();
        state.record_write(&key);
        debug!(key = %key, "Cache set");
        state.entries.insert(key, CachedData::new(value));
    }

    /// Update the cached value in place. Returns false, without calling `f`,
    /// when nothing is cached for `key`.
    pub fn merge<F>(&self, key: &QueryKey, f: F) -> bool
    where
        F: FnOnce(&mut QueryData),
    {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return false;
        };
        f(&mut entry.data);
        state.record_write(key);
        debug!(key = %key, "Cache merge");
        true
    }

    /// Mark the value stale so the next read fetches again. A fetch already in
    /// flight is detached: it may still finish, but readers no longer join it.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.invalidated = true;
        }
        state.in_flight.remove(key);
        debug!(key = %key, "Cache invalidate");
    }

    pub fn remove(&self, key: &QueryKey) -> Option<QueryData> {
        let mut state = self.lock();
        state.record_write(key);
        state.in_flight.remove(key);
        debug!(key = %key, "Cache remove");
        state.entries.remove(key).map(|e| e.data)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .map(|e| !e.is_stale(self.ttl))
            .unwrap_or(false)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    /// Human readable age of the cached value, if any
    pub fn age_display(&self, key: &QueryKey) -> Option<String> {
        self.lock().entries.get(key).map(|e| e.age_display())
    }

    // ===== Read-through =====

    /// Read `key`, fetching with `fetch` when needed.
    ///
    /// - fresh value: returned, nothing fetched
    /// - stale value: returned immediately, re-fetched in the background
    /// - missing or invalidated: the fetch is awaited
    ///
    /// `fetch` is only called when no fetch for `key` is pending; otherwise the
    /// pending one is shared.
    pub async fn query<F>(&self, key: QueryKey, fetch: F) -> StoreResult<QueryData>
    where
        F: FnOnce() -> FetchFuture,
    {
        let plan = {
            let mut state = self.lock();
            match state.entries.get(&key) {
                Some(entry) if !entry.is_stale(self.ttl) => ReadPlan::Hit(entry.data.clone()),
                Some(entry) if !entry.invalidated => {
                    let stale = entry.data.clone();
                    let (pending, started) = self.join_or_start(&mut state, &key, fetch);
                    ReadPlan::Revalidate(stale, started.then_some(pending))
                }
                _ => ReadPlan::Wait(self.join_or_start(&mut state, &key, fetch).0),
            }
        };

        match plan {
            ReadPlan::Hit(data) => {
                debug!(key = %key, "Cache hit");
                Ok(data)
            }
            ReadPlan::Revalidate(data, pending) => {
                debug!(key = %key, "Serving stale value");
                if let Some(pending) = pending {
                    Self::spawn(&key, pending);
                }
                Ok(data)
            }
            ReadPlan::Wait(pending) => pending.await,
        }
    }

    /// Make sure `key` is fresh or being fetched, without waiting for it.
    /// Must be called from within a tokio runtime.
    pub fn fetch_in_background<F>(&self, key: QueryKey, fetch: F) -> FetchState
    where
        F: FnOnce() -> FetchFuture,
    {
        let pending = {
            let mut state = self.lock();
            if state
                .entries
                .get(&key)
                .map(|e| !e.is_stale(self.ttl))
                .unwrap_or(false)
            {
                return FetchState::Fresh;
            }
            let (pending, started) = self.join_or_start(&mut state, &key, fetch);
            if !started {
                return FetchState::InFlight;
            }
            pending
        };

        Self::spawn(&key, pending);
        FetchState::Started
    }

    fn spawn(key: &QueryKey, pending: SharedFetch) {
        debug!(key = %key, "Spawning background fetch");
        tokio::spawn(async move {
            // The outcome is recorded by the fetch itself
            let _ = pending.await;
        });
    }

    /// Return the pending fetch for `key`, starting one if there is none.
    /// The flag tells whether a new fetch was started.
    fn join_or_start<F>(
        &self,
        state: &mut CacheState,
        key: &QueryKey,
        fetch: F,
    ) -> (SharedFetch, bool)
    where
        F: FnOnce() -> FetchFuture,
    {
        if let Some(in_flight) = state.in_flight.get(key) {
            debug!(key = %key, seq = in_flight.seq, "Joining pending fetch");
            return (in_flight.fetch.clone(), false);
        }

        let seq = state.next_seq();
        let cache = self.clone();
        let fetch_key = key.clone();
        let inner = fetch();
        let pending = async move {
            let result = inner.await;
            cache.finish_fetch(&fetch_key, seq, &result);
            result
        }
        .boxed()
        .shared();

        debug!(key = %key, seq, "Starting fetch");
        state.in_flight.insert(
            key.clone(),
            InFlight {
                seq,
                fetch: pending.clone(),
            },
        );
        (pending, true)
    }

    /// Record the outcome of fetch `seq`. The value is written only when no
    /// newer write to the key happened while the fetch was pending.
    fn finish_fetch(&self, key: &QueryKey, seq: u64, result: &StoreResult<QueryData>) {
        let mut state = self.lock();
        if state.in_flight.get(key).map(|f| f.seq) == Some(seq) {
            state.in_flight.remove(key);
        }

        match result {
            Ok(data) => {
                let last_write = state.last_write.get(key).copied().unwrap_or(0);
                if seq > last_write {
                    state.last_write.insert(key.clone(), seq);
                    state.entries.insert(key.clone(), CachedData::new(data.clone()));
                    debug!(key = %key, seq, "Fetch stored");
                } else {
                    debug!(key = %key, seq, last_write, "Discarding superseded fetch result");
                }
            }
            Err(e) => {
                warn!(key = %key, seq, error = %e, "Fetch failed");
            }
        }
    }
}
