//! Integration Tests for the TTL cache
//!
//! Exercises expiration, sweeping and concurrent access through the public handle.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proxy_host::cache::{Expiry, TtlCache};
use tokio::time::sleep;

const HOUR: Duration = Duration::from_secs(3600);

// == Expiration Scenarios ==

#[tokio::test(start_paused = true)]
async fn test_default_ttl_expiry_then_sweep() {
    let cache = TtlCache::new(Duration::from_millis(100), Duration::from_millis(50));

    cache.set("a", "x", Duration::ZERO);
    assert_eq!(cache.get("a"), Some("x"));

    sleep(Duration::from_millis(120)).await;
    assert_eq!(cache.get("a"), None);

    sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.len(), 0, "Swept entry should be physically gone");

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_hidden_before_sweep() {
    let cache = TtlCache::new(HOUR, HOUR);

    cache.set("a", 1, Duration::from_millis(50));
    sleep(Duration::from_millis(60)).await;

    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.len(), 1, "No sweep has run yet");

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_zero_default_never_expires() {
    let cache = TtlCache::new(Duration::ZERO, Duration::from_secs(3600 * 24));

    cache.set("a", "forever", Duration::ZERO);
    sleep(Duration::from_secs(3600 * 24 * 30)).await;

    assert_eq!(cache.get("a"), Some("forever"));
    assert_eq!(cache.expiry("a"), Some(Expiry::Never));
    assert!(cache.stats().sweeps >= 29);

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_sweep_removes_unread_entries() {
    let cache = TtlCache::new(HOUR, Duration::from_secs(1));

    for i in 0..100 {
        cache.set(format!("key{}", i), i, Duration::from_millis(500));
    }
    cache.set("survivor", 1000, Duration::ZERO);

    sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().swept, 100);
    assert_eq!(cache.get("survivor"), Some(1000));

    cache.stop();
}

// == Delete / Extend ==

#[tokio::test(start_paused = true)]
async fn test_delete_then_get() {
    let cache = TtlCache::new(HOUR, HOUR);

    cache.set("a", 1, Duration::ZERO);
    cache.delete("a");
    cache.delete("a");
    cache.delete("never-set");

    assert_eq!(cache.get("a"), None);

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_extend_replaces_remaining_ttl() {
    let cache = TtlCache::new(Duration::ZERO, HOUR);

    cache.set("b", "y", HOUR);
    cache.extend("b", 2 * HOUR);

    let remaining = cache.expiry("b").and_then(|expiry| expiry.remaining());
    assert_eq!(remaining, Some(2 * HOUR));

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_extend_keeps_entry_alive() {
    let cache = TtlCache::new(Duration::from_secs(10), Duration::from_secs(1));

    cache.set("a", 1, Duration::ZERO);
    for _ in 0..5 {
        sleep(Duration::from_secs(8)).await;
        cache.extend("a", Duration::ZERO);
    }

    assert_eq!(cache.get("a"), Some(1));

    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn test_extend_absent_is_noop() {
    let cache: TtlCache<u32> = TtlCache::new(HOUR, HOUR);

    cache.extend("missing", HOUR);

    assert_eq!(cache.get("missing"), None);
    assert!(cache.is_empty());

    cache.stop();
}

// == Lifecycle ==

#[tokio::test(start_paused = true)]
async fn test_stop_halts_sweeping() {
    let cache = TtlCache::new(Duration::from_millis(10), Duration::from_millis(100));
    cache.set("a", 1, Duration::ZERO);

    cache.stop();
    cache.stop();
    sleep(Duration::from_secs(1)).await;

    assert!(cache.is_stopped());
    assert_eq!(cache.stats().sweeps, 0);
    assert_eq!(cache.len(), 1);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_writers_distinct_keys() {
    let cache = Arc::new(TtlCache::new(HOUR, Duration::from_millis(5)));

    thread::scope(|scope| {
        for writer in 0..8 {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..500 {
                    cache.set(format!("w{}-{}", writer, i), (writer, i), Duration::ZERO);
                }
            });
        }
    });

    assert_eq!(cache.len(), 8 * 500);
    for writer in 0..8 {
        for i in 0..500 {
            assert_eq!(cache.get(&format!("w{}-{}", writer, i)), Some((writer, i)));
        }
    }

    cache.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_readers_never_see_torn_values() {
    let cache = Arc::new(TtlCache::new(HOUR, Duration::from_millis(1)));
    cache.set("shared", (0u64, 0u64), Duration::ZERO);

    thread::scope(|scope| {
        for _ in 0..2 {
            let cache = &cache;
            scope.spawn(move || {
                for n in 1..=2000u64 {
                    cache.set("shared", (n, n), Duration::ZERO);
                    cache.extend("shared", Duration::ZERO);
                }
            });
        }
        for _ in 0..4 {
            let cache = &cache;
            scope.spawn(move || {
                for _ in 0..5000 {
                    let (left, right) = cache.get("shared").expect("never expires within an hour");
                    assert_eq!(left, right);
                }
            });
        }
    });

    assert_eq!(cache.get("shared"), Some((2000, 2000)));

    cache.stop();
}
