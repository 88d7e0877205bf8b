//! Safe Cache Module
//!
//! Serialized access layer over [`CacheMap`]. Every operation, including the
//! periodic sweep, runs inside one critical section, so all operations
//! observe a single total order and the map never sees concurrent mutation.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use crate::cache::{CacheMap, CacheStats, Expiry};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, sweep_expired};

// == Cache State ==
/// Everything guarded by the serialization point.
#[derive(Debug)]
pub(crate) struct CacheState<K, V> {
    pub(crate) map: CacheMap<K, V>,
    pub(crate) stats: CacheStats,
}

/// Shared handle to the serialized state.
pub(crate) type SharedState<K, V> = Arc<Mutex<CacheState<K, V>>>;

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            map: CacheMap::new(),
            stats: CacheStats::new(),
        }
    }
}

struct Inner<K, V> {
    state: SharedState<K, V>,
    config: CacheConfig,
    sweeper: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> Inner<K, V> {
    fn stop_sweeper(&self) -> bool {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<K, V> Drop for Inner<K, V> {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

// == Safe Cache ==
/// Concurrency-safe TTL cache with background eviction.
///
/// Cloning is cheap and yields another handle to the same cache. The
/// background sweeper stops when [`SafeCache::shutdown`] is called or the
/// last handle is dropped.
///
/// Values are cloned out on [`get`](SafeCache::get); wrap them in
/// [`Arc`] when cloning is expensive or the payload must be shared. The
/// cache protects its own bookkeeping only, not payloads callers hold.
pub struct SafeCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for SafeCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> std::fmt::Debug for SafeCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeCache")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<K, V> SafeCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    // == Constructors ==
    /// Creates a cache that sweeps expired entries every `eviction_interval`.
    ///
    /// Must be called from within a tokio runtime, which hosts the sweeper.
    ///
    /// # Errors
    /// - [`CacheError::InvalidConfig`] if the interval is zero
    /// - [`CacheError::NoRuntime`] if no tokio runtime is available
    pub fn new(eviction_interval: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::new(eviction_interval))
    }

    /// Creates a cache from a full [`CacheConfig`].
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let state: SharedState<K, V> = Arc::new(Mutex::new(CacheState::new()));
        let sweeper = spawn_sweeper(&runtime, Arc::clone(&state), &config);

        Ok(Self {
            inner: Arc::new(Inner {
                state,
                config,
                sweeper: std::sync::Mutex::new(Some(sweeper)),
            }),
        })
    }

    // == Put ==
    /// Inserts or overwrites `key`, replacing any previous deadline.
    ///
    /// A TTL is measured from the moment `put` is called. An absolute
    /// deadline in the past is accepted; the entry is simply absent on the
    /// next read. Once `put` returns, the write is ordered before every
    /// operation the caller issues afterwards.
    pub async fn put(&self, key: K, value: V, expiry: impl Into<Expiry>) {
        let entry = expiry.into().into_entry(value, Instant::now());
        let mut state = self.inner.state.lock().await;
        state.map.put(key, entry);
    }

    // == Update Value ==
    /// Replaces the value of a live entry, keeping its deadline.
    ///
    /// Returns false if the key is absent or expired at `now`.
    pub async fn update_value<Q>(&self, key: &Q, value: V, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut state = self.inner.state.lock().await;
        let before = state.map.len();
        let updated = state.map.update_value(key, value, now);
        let expired = before - state.map.len();
        state.stats.record_expirations(expired);
        updated
    }

    // == Delete ==
    /// Removes `key`, reporting whether an entry was stored.
    ///
    /// Deleting an absent key is a no-op that returns false.
    pub async fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.state.lock().await.map.delete(key)
    }

    // == Size ==
    /// Returns the stored entry count.
    ///
    /// Entries that expired since the last sweep and were not read since are
    /// still counted.
    pub async fn size(&self) -> usize {
        self.inner.state.lock().await.map.len()
    }

    // == Evict Expired ==
    /// Runs one eviction pass now, outside the regular schedule.
    ///
    /// Returns the number of entries removed.
    pub async fn evict_expired(&self) -> usize {
        sweep_expired(&self.inner.state, self.inner.config.sweep_batch_size).await
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.map.len());
        stats
    }

    // == Lifecycle ==
    /// Returns the config this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Returns true while the background sweeper is active.
    pub fn is_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the background sweeper for every handle of this cache.
    ///
    /// The cache stays usable afterwards; expired entries are then only
    /// removed lazily or through [`evict_expired`](SafeCache::evict_expired).
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        if self.inner.stop_sweeper() {
            info!("Eviction task stopped");
        }
    }
}

impl<K, V> SafeCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    // == Get ==
    /// Returns a clone of the value for `key` if it is live at `now`.
    ///
    /// An expired entry, or one without a deadline, reads as absent and is
    /// removed. Absent, expired and never-dated keys are indistinguishable.
    pub async fn get<Q>(&self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut state = self.inner.state.lock().await;
        let before = state.map.len();
        let value = state.map.get(key, now).cloned();
        let expired = before - state.map.len();
        state.stats.record_expirations(expired);

        match value {
            Some(_) => state.stats.record_hit(),
            None => state.stats.record_miss(),
        }
        value
    }
}
