//! Response models for the proxy admin endpoints.

pub mod responses;

pub use responses::{HealthResponse, StatsResponse};
