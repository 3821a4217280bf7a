//! Transport-neutral request types.
//!
//! # Responsibilities
//! - Carry what the transport adapter decoded (method, path, headers, query, body, identity)
//! - Strip a deployment stage prefix before routing
//! - Expose the per-request context seen by command factories and policy predicates

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::dispatch::DispatchError;
use crate::security::claims::{ClaimMap, IdentitySources};

/// A request as decoded by the outer transport adapter.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: Bytes,
    pub identity: IdentitySources,
}

impl GatewayRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_identity(mut self, identity: IdentitySources) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Remove `prefix` from the front of `path` when it ends at a segment boundary.
///
/// `strip_stage_prefix("/prod/items", "/prod")` yields `/items`;
/// `/production/items` is left untouched.
pub fn strip_stage_prefix(path: &str, prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(prefix) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

/// Everything a command factory or custom policy predicate may inspect.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    /// Path parameters keyed by lower-cased slot name.
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub claims: ClaimMap,
}

impl RequestContext {
    /// Context carrying only claims, for evaluating requirements outside a request.
    pub fn from_claims(claims: ClaimMap) -> Self {
        Self {
            claims,
            ..Default::default()
        }
    }

    /// Path parameter lookup; the name is case-insensitive.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }

    /// Required path parameter; absence is a validation failure.
    pub fn require_param(&self, name: &str) -> Result<&str, DispatchError> {
        self.param(name)
            .ok_or_else(|| DispatchError::Validation(format!("missing path parameter '{}'", name)))
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| DispatchError::Validation(format!("invalid request body: {}", e)))
    }
}
