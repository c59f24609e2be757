//! Proxy Module
//!
//! Host-keyed reverse proxy: resolves the inbound Host to an upstream, memoizes the
//! upstream in the TTL cache and forwards the request.

pub mod handlers;
pub mod routes;
pub mod upstream;

pub use handlers::AppState;
pub use routes::create_router;
pub use upstream::{Resolver, Upstream};
