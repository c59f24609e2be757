//! Error types for the proxy
//!
//! The cache itself is infallible; these cover request handling and forwarding.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for proxied requests.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request carried no usable Host header
    #[error("Missing Host header")]
    MissingHost,

    /// No upstream is configured for the host
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    /// Request could not be read or rebuilt
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body exceeded the configured limit
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Upstream could not be reached or answered badly
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MissingHost => StatusCode::BAD_REQUEST,
            ProxyError::UnknownHost(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
