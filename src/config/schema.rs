//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::ResponseShape;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Boundary behaviour (health payload, stage prefix, redaction).
    pub gateway: GatewaySettings,

    /// Where identity data is read from.
    pub identity: IdentityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Command backend.
    pub backend: BackendConfig,

    /// Retry configuration for the command backend.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Named authorization policies.
    pub policies: Vec<PolicyConfig>,

    /// Declarative routes, matched in file order.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Boundary behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Reported as `function` by the health endpoint.
    pub function_name: String,

    /// Reported as `environment` by the health endpoint.
    pub environment: String,

    /// Deployment stage prefix removed before routing (e.g. "/prod").
    pub stage_prefix: Option<String>,

    /// Replace messages of unclassified failures with a generic text.
    pub redact_internal_errors: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            function_name: env!("CARGO_PKG_NAME").to_string(),
            environment: "development".to_string(),
            stage_prefix: None,
            redact_internal_errors: false,
        }
    }
}

/// Identity headers set by a trusted upstream authorizer.
///
/// Both are unset by default: without them every caller is anonymous.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Header carrying token claims as a JSON object.
    pub claims_header: Option<String>,

    /// Header carrying a generic authorizer context as a JSON object.
    pub context_header: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Command backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// URL commands are POSTed to.
    pub url: String,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000/commands".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when RUST_LOG is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A named policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Unique policy name.
    pub name: String,

    /// Any one of these roles satisfies the policy's role check.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Claim type → accepted values (empty = presence only).
    #[serde(default)]
    pub claims: BTreeMap<String, Vec<String>>,
}

/// A declarative route bound to a backend command.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method.
    pub method: String,

    /// Path template, e.g. "/items/{id}".
    pub path: String,

    /// Command name forwarded to the backend.
    pub command: String,

    /// Declared response shape.
    #[serde(default)]
    pub response: ResponseShape,

    #[serde(default)]
    pub allow_anonymous: bool,

    /// Any one of these roles is accepted.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Named policies, all of which must pass.
    #[serde(default)]
    pub policies: Vec<String>,

    /// Claim type → accepted values (empty = presence only).
    #[serde(default)]
    pub claims: BTreeMap<String, Vec<String>>,

    /// Response content type override.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Extra response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}
