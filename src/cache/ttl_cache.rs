//! TTL Cache Module
//!
//! Owned cache handle tying a [`CacheStore`] to its background sweep task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore, Expiry};
use crate::tasks::spawn_sweep_task;

// == TTL Cache ==
/// A concurrency-safe, time-expiring key/value cache.
///
/// Expired entries are hidden from readers immediately and physically removed by a
/// background sweep every `sweep_interval`. The sweep runs until [`stop`](Self::stop)
/// is called or the cache is dropped.
///
/// Values are cloned out on [`get`](Self::get); store expensive objects as `Arc<T>`.
///
/// # Example
/// ```ignore
/// let cache = TtlCache::new(Duration::from_secs(300), Duration::from_secs(30));
/// cache.set("example.com", Arc::new(handler), Duration::ZERO);
/// let handler = cache.get("example.com");
/// cache.stop();
/// ```
#[derive(Debug)]
pub struct TtlCache<V> {
    store: Arc<CacheStore<V>>,
    stop_tx: watch::Sender<bool>,
}

impl<V> TtlCache<V>
where
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty cache and starts its sweep task.
    ///
    /// `default_ttl` is used whenever a caller passes `Duration::ZERO`; if it is
    /// zero too, such entries never expire. A zero `sweep_interval` disables the
    /// background sweep: expired entries are then only hidden, never reclaimed
    /// unless deleted.
    ///
    /// # Panics
    /// Panics if `sweep_interval` is non-zero and this is called outside a Tokio runtime.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let store = Arc::new(CacheStore::new(default_ttl));
        let (stop_tx, stop_rx) = watch::channel(false);

        if sweep_interval.is_zero() {
            warn!("Sweep interval is zero, expired entries will not be reclaimed");
        } else {
            spawn_sweep_task(Arc::downgrade(&store), sweep_interval, stop_rx);
        }

        info!(?default_ttl, ?sweep_interval, "TTL cache created");
        Self { store, stop_tx }
    }
}

impl<V> TtlCache<V> {
    /// Inserts or overwrites `key`. A zero `ttl` uses the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    /// Returns the value for `key` unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.store.get(key)
    }

    /// Removes `key`. No-op if absent.
    pub fn delete(&self, key: &str) {
        self.store.delete(key);
    }

    /// Refreshes the expiry of `key` without changing its value. No-op if absent.
    ///
    /// See [`CacheStore::extend`] for how a zero TTL is resolved.
    pub fn extend(&self, key: &str, ttl: Duration) {
        self.store.extend(key, ttl);
    }

    /// Returns the expiry of a live entry.
    pub fn expiry(&self, key: &str) -> Option<Expiry> {
        self.store.expiry(key)
    }

    /// Runs one sweep pass immediately, returning the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Number of stored entries, including expired ones awaiting the sweep.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if no entries are stored, expired ones included.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the TTL used when a caller passes `Duration::ZERO`.
    pub fn default_ttl(&self) -> Duration {
        self.store.default_ttl()
    }

    /// Returns a snapshot of the read and sweep counters.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    // == Stop ==
    /// Signals the sweep task to exit and returns without waiting for it.
    ///
    /// Idempotent. A sweep pass already in progress completes. The cache stays
    /// usable afterwards but is no longer swept, so it should be discarded.
    pub fn stop(&self) {
        if !self.stop_tx.send_replace(true) {
            debug!("TTL cache sweep stop requested");
        }
    }

    /// Returns true once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_cache_sweeps_in_background() {
        let cache = TtlCache::new(Duration::from_millis(100), Duration::from_millis(50));
        cache.set("a", "x", Duration::ZERO);

        sleep(Duration::from_millis(160)).await;

        assert!(cache.is_empty());
        assert!(cache.stats().sweeps >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::ZERO, Duration::from_millis(10));
        assert!(!cache.is_stopped());

        cache.stop();
        cache.stop();

        assert!(cache.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sweeps_after_stop() {
        let cache = TtlCache::new(Duration::from_millis(10), Duration::from_millis(50));
        cache.set("a", 1, Duration::ZERO);
        cache.stop();

        sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.stats().sweeps, 0);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_zero_sweep_interval_needs_no_runtime() {
        let cache = TtlCache::new(Duration::ZERO, Duration::ZERO);
        cache.set("a", 1, Duration::ZERO);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.expiry("a"), Some(Expiry::Never));
    }
}
