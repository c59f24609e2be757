//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use tracing::warn;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub server_port: u16,
    /// Upstream authority used for hosts without an explicit route
    pub default_target: Option<String>,
    /// Inbound host -> upstream authority
    pub routes: HashMap<String, String>,
    /// Default TTL in seconds for cached upstreams
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Largest request body forwarded upstream, in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PROXY_PORT` - HTTP listen port (default: 9999)
    /// - `PROXY_DEFAULT_TARGET` - Fallback upstream `host:port` (default: none)
    /// - `PROXY_ROUTES` - Comma separated `host=target` pairs (default: empty)
    /// - `CACHE_DEFAULT_TTL` - Upstream cache TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 30)
    /// - `PROXY_MAX_BODY_BYTES` - Request body limit (default: 10 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("PROXY_PORT").unwrap_or(defaults.server_port),
            default_target: env::var("PROXY_DEFAULT_TARGET")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string()),
            routes: env::var("PROXY_ROUTES")
                .map(|v| parse_routes(&v))
                .unwrap_or_default(),
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: parse_var("CACHE_SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            max_body_bytes: parse_var("PROXY_MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 9999,
            default_target: None,
            routes: HashMap::new(),
            default_ttl: 300,
            sweep_interval: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Parses `host=target,host=target`. Malformed pairs are skipped.
pub fn parse_routes(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| match pair.split_once('=') {
            Some((host, target)) if !host.trim().is_empty() && !target.trim().is_empty() => {
                Some((host.trim().to_string(), target.trim().to_string()))
            }
            _ => {
                warn!("Ignoring malformed route '{}'", pair);
                None
            }
        })
        .collect()
}
