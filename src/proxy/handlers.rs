//! Proxy Handlers
//!
//! The catch-all forwarding handler plus the admin endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, Response},
    Json,
};
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::models::{HealthResponse, StatsResponse};
use crate::proxy::{Resolver, Upstream};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstreams memoized by inbound host
    pub cache: Arc<TtlCache<Arc<Upstream>>>,
    /// Host -> target lookup used on cache misses
    pub resolver: Arc<Resolver>,
    /// Connection pool shared by every upstream
    pub client: reqwest::Client,
    /// Request body limit
    pub max_body_bytes: usize,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<TtlCache<Arc<Upstream>>>, resolver: Resolver, max_body_bytes: usize) -> Self {
        Self {
            cache,
            resolver: Arc::new(resolver),
            client: reqwest::Client::new(),
            max_body_bytes,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the cache sweep task, so this must run inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let cache = TtlCache::new(config.default_ttl(), config.sweep_interval());
        Self::new(
            Arc::new(cache),
            Resolver::from_config(config),
            config.max_body_bytes,
        )
    }

    // == Upstream Lookup ==
    /// Returns the cached upstream for `host`, resolving and caching it on a miss.
    ///
    /// Two concurrent misses for the same host may both resolve; the last one cached wins.
    pub fn upstream_for(&self, host: &str) -> Result<Arc<Upstream>> {
        if let Some(upstream) = self.cache.get(host) {
            return Ok(upstream);
        }

        let target = self
            .resolver
            .resolve(host)
            .ok_or_else(|| ProxyError::UnknownHost(host.to_string()))?;
        debug!(host, target = %target, "Upstream cache miss");

        let upstream = Arc::new(Upstream::new(target, self.client.clone()));
        self.cache.set(host, upstream.clone(), Duration::ZERO);
        Ok(upstream)
    }
}

/// Fallback handler: forwards every request not matched by an admin route.
///
/// The peer address comes from [`ConnectInfo`] when the server was started with
/// `into_make_service_with_connect_info`; without it `X-Forwarded-For` is left alone.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response<Body>> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| request.uri().authority().map(|authority| authority.to_string()))
        .filter(|host| !host.is_empty())
        .ok_or(ProxyError::MissingHost)?;

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let upstream = state.upstream_for(&host)?;
    upstream
        .forward(request, &host, client_ip, state.max_body_bytes)
        .await
}

/// Handler for GET /_proxy/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats()))
}

/// Handler for GET /_proxy/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
