//! Cache Module
//!
//! Provides a generic in-memory cache with lazy TTL expiration and background sweeping.

mod entry;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::{CacheEntry, Expiry};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use ttl_cache::TtlCache;
