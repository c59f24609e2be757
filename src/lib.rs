//! Proxy Host - a host-keyed reverse proxy
//!
//! The core is a generic, concurrency-safe TTL cache ([`cache::TtlCache`]) with lazy
//! expiration and a background sweep; the proxy uses it to memoize upstream
//! forwarders by inbound host name.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use cache::TtlCache;
pub use config::Config;
pub use proxy::{create_router, AppState};
