//! Cache Map Module
//!
//! Unsynchronized key-to-entry storage with lazy expiry on access. Callers
//! must already hold exclusive access; `SafeCache` is the only owner in
//! this crate.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Cache Map ==
/// Plain map from key to [`CacheEntry`], with no concurrency control.
#[derive(Debug)]
pub struct CacheMap<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for CacheMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    // == Put ==
    /// Inserts or overwrites the entry for `key`, replacing its deadline too.
    pub fn put(&mut self, key: K, entry: CacheEntry<V>) {
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Returns the value for `key` if it is live at `now`.
    ///
    /// A stored entry that is expired (or never had a deadline) is removed
    /// from the map as a side effect.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let live = self.entries.get(key)?.is_live(now);
        if !live {
            self.entries.remove(key);
            return None;
        }

        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Returns true if `key` is stored and live at `now`, applying lazy expiry.
    pub fn contains_live<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key, now).is_some()
    }

    // == Update Value ==
    /// Replaces the value of a live entry without touching its deadline.
    ///
    /// Returns false if the key is absent or no longer live at `now`; an
    /// expired entry is removed the same way `get` removes it.
    pub fn update_value<Q>(&mut self, key: &Q, value: V, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.contains_live(key, now) {
            return false;
        }
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.update_value(value);
                true
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes the entry for `key`, reporting whether anything was removed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries.remove(key).is_some()
    }

    // == Length ==
    /// Returns the number of stored entries, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Keys ==
    /// Snapshots the current key set.
    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    // == Evict Expired ==
    /// Runs the lazy-expiry check against every stored key.
    ///
    /// Returns the number of entries removed.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let keys = self.keys();
        self.evict_keys(&keys, now)
    }

    /// Runs the lazy-expiry check against the given keys only.
    ///
    /// Keys that are no longer stored are skipped.
    pub fn evict_keys(&mut self, keys: &[K], now: Instant) -> usize {
        let before = self.entries.len();
        for key in keys {
            let _ = self.get(key, now);
        }
        before - self.entries.len()
    }
}
