//! Upstream Module
//!
//! Target resolution and request forwarding to a single upstream authority.

use std::collections::HashMap;
use std::net::IpAddr;

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Response,
    },
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::warn;

use crate::config::Config;
use crate::error::{ProxyError, Result};

const X_PROXY_HOST: HeaderName = HeaderName::from_static("x-proxy-host");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that only apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

// == Resolver ==
/// Maps inbound host names to upstream authorities (`host:port`).
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    routes: HashMap<String, String>,
    default_target: Option<String>,
}

impl Resolver {
    pub fn new(routes: HashMap<String, String>, default_target: Option<String>) -> Self {
        Self {
            routes,
            default_target,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.routes.clone(), config.default_target.clone())
    }

    // == Resolve ==
    /// Looks up the exact host, then the host without its port, then the default target.
    pub fn resolve(&self, host: &str) -> Option<String> {
        self.routes
            .get(host)
            .or_else(|| self.routes.get(strip_port(host)))
            .or(self.default_target.as_ref())
            .cloned()
    }
}

/// Drops a trailing `:port`. Bracketed IPv6 literals keep their brackets and a bare
/// IPv6 address (several colons, no brackets) is returned unchanged.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _)) if !name.contains(':') => name,
        _ => host,
    }
}

// == Upstream ==
/// A forwarder bound to one upstream authority. Cached per inbound host.
#[derive(Debug)]
pub struct Upstream {
    target: String,
    client: reqwest::Client,
}

impl Upstream {
    pub fn new(target: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            target: target.into(),
            client,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    // == Forward ==
    /// Sends `request` to the upstream and relays the answer.
    ///
    /// The inbound Host is replaced by the target and recorded in
    /// `X-Forwarded-Host`; `client_ip` is appended to `X-Forwarded-For` and
    /// `X-Proxy-Host: true` marks the request as proxied. The request body is
    /// buffered up to `max_body_bytes`; the response body is streamed back as it
    /// arrives.
    pub async fn forward(
        &self,
        request: Request,
        inbound_host: &str,
        client_ip: Option<IpAddr>,
        max_body_bytes: usize,
    ) -> Result<Response<Body>> {
        let (parts, body) = request.into_parts();
        let body = Limited::new(body, max_body_bytes)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ProxyError::PayloadTooLarge(max_body_bytes)
                } else {
                    ProxyError::InvalidRequest(e.to_string())
                }
            })?
            .to_bytes();

        let path = parts
            .uri
            .path_and_query()
            .map_or("/", |path_and_query| path_and_query.as_str());
        let url = format!("http://{}{}", self.target, path);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(X_PROXY_HOST, HeaderValue::from_static("true"));
        if let Ok(value) = HeaderValue::from_str(inbound_host) {
            headers.insert(X_FORWARDED_HOST, value);
        }
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut headers, ip);
        }

        let upstream_response = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .inspect_err(|e| warn!(url = %url, error = %e, "Upstream request failed"))?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// Removes the standard hop-by-hop headers plus any header named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    for name in &listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Appends `ip` to any existing `X-Forwarded-For` values, collapsing them into one header.
fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let mut chain: Vec<String> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_owned)
        .collect();
    chain.push(ip.to_string());
    if let Ok(value) = HeaderValue::from_str(&chain.join(", ")) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
