//! Cache Store Module
//!
//! Thread-safe map of keys to expiring values, guarded by a single reader/writer lock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats, Expiry};

// == Cache Store ==
/// Key/value storage with per-entry expiry.
///
/// `get` takes the shared lock; every mutation (including a sweep pass) takes the
/// exclusive lock for its whole duration. Expired entries stay in the map until
/// [`purge_expired`](Self::purge_expired) or [`delete`](Self::delete) removes them,
/// but are never returned to readers.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    /// TTL applied when a caller passes `Duration::ZERO`
    default_ttl: Duration,
    /// Read and sweep counters
    stats: StatsCounters,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// A zero `default_ttl` makes entries stored without an explicit TTL live forever.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            stats: StatsCounters::default(),
        }
    }

    /// Returns the TTL substituted for `Duration::ZERO`.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn resolve_ttl(&self, ttl: Duration) -> Duration {
        if ttl.is_zero() {
            self.default_ttl
        } else {
            ttl
        }
    }

    // == Set ==
    /// Inserts or overwrites the entry for `key`.
    ///
    /// A zero `ttl` uses the default TTL; if that is zero as well the entry never expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.resolve_ttl(ttl));
        self.entries.write().insert(key.into(), entry);
    }

    // == Get ==
    /// Returns a clone of the value for `key` if present and not expired.
    ///
    /// An expired entry is reported as absent but left in place for the next sweep.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let entries = self.entries.read();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.expiry.is_expired_at(now) => {
                self.stats.record_expired_read();
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`. Does nothing if it is absent.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    // == Extend ==
    /// Pushes back the expiry of an existing entry without touching its value.
    ///
    /// Does nothing if `key` is absent. An entry already past its expiry counts as
    /// absent and is not revived.
    /// A zero `ttl` uses the default TTL. If that is zero as well, the current
    /// expiry is kept as is: extending never turns an expiring entry into a
    /// permanent one.
    pub fn extend(&self, key: &str, ttl: Duration) {
        let ttl = self.resolve_ttl(ttl);
        if ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.write();
        let now = Instant::now();
        if let Some(entry) = entries.get_mut(key) {
            if !entry.expiry.is_expired_at(now) {
                entry.expiry = Expiry::from_ttl(now, ttl);
            }
        }
    }

    // == Expiry ==
    /// Returns the expiry of a live entry, or `None` if it is absent or expired.
    pub fn expiry(&self, key: &str) -> Option<Expiry> {
        let entries = self.entries.read();
        let now = Instant::now();
        entries
            .get(key)
            .filter(|entry| !entry.expiry.is_expired_at(now))
            .map(|entry| entry.expiry)
    }

    // == Purge Expired ==
    /// Physically removes every expired entry. One sweep pass.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| !entry.expiry.is_expired_at(now));
            before - entries.len()
        };
        self.stats.record_sweep(removed);
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }
}
