//! Health endpoint.
//!
//! Health paths bypass routing and authorization entirely.

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::response::GatewayResponse;

/// Paths answered as health checks, compared case-insensitively.
pub const HEALTH_PATHS: [&str; 4] = ["/health", "/health/", "/healthz", "/healthz/"];

pub fn is_health_path(path: &str) -> bool {
    HEALTH_PATHS.iter().any(|p| p.eq_ignore_ascii_case(path))
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthBody {
    pub status: String,
    pub function: String,
    pub timestamp: String,
    pub environment: String,
}

pub fn health_response(function: &str, environment: &str) -> GatewayResponse {
    GatewayResponse::json(
        StatusCode::OK,
        HealthBody {
            status: "healthy".to_string(),
            function: function.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            environment: environment.to_string(),
        },
    )
}
