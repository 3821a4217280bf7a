//! Response payloads and status mapping.
//!
//! # Responsibilities
//! - Build the fixed error, no-route and health payload shapes
//! - Map dispatch failures to status codes
//! - Convert into an axum response
//!
//! # Status Table
//! ```text
//! Validation   → 400    NotFound  → 404
//! Unauthorized → 401    Forbidden → 403
//! Conflict     → 409    other     → 500
//! no route     → 404 {error, path, method}
//! ```

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::DispatchError;

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// Body returned when no route matches.
#[derive(Debug, Clone, Serialize)]
pub struct RouteNotFoundBody {
    pub error: String,
    pub path: String,
    pub method: String,
}

/// A transport-neutral response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body; `None` for empty responses.
    pub body: Option<Value>,
}

impl GatewayResponse {
    pub fn json(status: StatusCode, body: impl Serialize) -> Self {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn error(status: StatusCode, error: &str, details: impl Into<String>) -> Self {
        Self::json(
            status,
            ErrorBody {
                error: error.to_string(),
                details: details.into(),
            },
        )
    }

    pub fn route_not_found(path: &str, method: &str) -> Self {
        Self::json(
            StatusCode::NOT_FOUND,
            RouteNotFoundBody {
                error: "Route not found".to_string(),
                path: path.to_string(),
                method: method.to_string(),
            },
        )
    }

    pub fn unauthenticated(reason: &str) -> Self {
        Self::error(StatusCode::UNAUTHORIZED, "Unauthorized", reason)
    }

    pub fn forbidden(reason: &str) -> Self {
        Self::error(StatusCode::FORBIDDEN, "Forbidden", reason)
    }

    /// Map a dispatch failure. `redact` hides the message of unclassified failures.
    pub fn from_dispatch_error(err: &DispatchError, redact: bool) -> Self {
        let (status, label) = match err {
            DispatchError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            DispatchError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            DispatchError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            DispatchError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            DispatchError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            DispatchError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        let details = match err {
            DispatchError::Other(_) if redact => "internal error",
            _ => err.message(),
        };
        Self::error(status, label, details)
    }

    /// Set a header, skipping names or values that are not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let GatewayResponse { status, mut headers, body } = self;

        let body = match body {
            None => Body::empty(),
            Some(value) => {
                let json_content = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.contains("json"))
                    .unwrap_or(true);
                if !headers.contains_key(header::CONTENT_TYPE) {
                    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                match value {
                    // Non-JSON content types carry string payloads verbatim.
                    Value::String(text) if !json_content => Body::from(text),
                    other => Body::from(other.to_string()),
                }
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().extend(headers);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_status_table() {
        let cases = [
            (DispatchError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DispatchError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (DispatchError::Unauthorized("who".into()), StatusCode::UNAUTHORIZED),
            (DispatchError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (DispatchError::Conflict("dup".into()), StatusCode::CONFLICT),
            (DispatchError::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let response = GatewayResponse::from_dispatch_error(&err, false);
            assert_eq!(response.status, status);
            assert_eq!(response.body.unwrap()["details"], err.message());
        }
    }

    #[test]
    fn test_redaction_only_hits_unclassified() {
        let other = GatewayResponse::from_dispatch_error(&DispatchError::Other("db password".into()), true);
        assert_eq!(other.body.unwrap()["details"], "internal error");

        let conflict = GatewayResponse::from_dispatch_error(&DispatchError::Conflict("exists".into()), true);
        assert_eq!(conflict.body.unwrap()["details"], "exists");
    }

    #[test]
    fn test_route_not_found_shape() {
        let response = GatewayResponse::route_not_found("/nope", "GET");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let body = response.body.unwrap();
        assert_eq!(body["error"], "Route not found");
        assert_eq!(body["path"], "/nope");
        assert_eq!(body["method"], "GET");
    }

    #[test]
    fn test_into_response_defaults_to_json() {
        let response = GatewayResponse::json(StatusCode::OK, serde_json::json!({"ok": true})).into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let response = GatewayResponse::empty(StatusCode::NO_CONTENT)
            .with_header("bad header", "x")
            .with_header("x-ok", "1");
        assert_eq!(response.headers.len(), 1);
    }
}
