//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a task that sweeps `store` every `interval`.
///
/// The first pass runs one full interval after spawning. The task exits when
/// `stop` carries `true`, when its sender is dropped, or when the store itself
/// has been dropped, so it never outlives the cache that owns it.
///
/// # Panics
/// Panics if called outside a Tokio runtime, or if `interval` is zero.
pub fn spawn_sweep_task<V>(
    store: Weak<CacheStore<V>>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::spawn(async move {
        debug!(?interval, "TTL sweep task started");

        loop {
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let Some(store) = store.upgrade() else {
                        break;
                    };
                    let removed = store.purge_expired();

                    if removed > 0 {
                        info!("TTL sweep: removed {} expired entries", removed);
                    } else {
                        debug!("TTL sweep: no expired entries found");
                    }
                }
            }
        }

        debug!("TTL sweep task stopped");
    })
}
