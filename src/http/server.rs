//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that feeds every request into the `Gateway`
//! - Decode axum requests into `GatewayRequest` (query, body, identity headers)
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and shut down gracefully

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, IdentityConfig};
use crate::dispatch::Dispatcher;
use crate::http::pipeline::Gateway;
use crate::http::request::GatewayRequest;
use crate::http::response::GatewayResponse;
use crate::security::{ClaimMap, ContextValue, IdentitySources};

/// Application state injected into the handler.
pub struct AppState<C, D> {
    pub gateway: Arc<Gateway<C, D>>,
    pub identity: IdentityConfig,
    pub max_body_bytes: usize,
}

impl<C, D> Clone for AppState<C, D> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            identity: self.identity.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a fully configured gateway.
    pub fn new<C, D>(gateway: Arc<Gateway<C, D>>, config: &GatewayConfig) -> Self
    where
        C: Send + 'static,
        D: Dispatcher<C>,
    {
        let state = AppState {
            gateway,
            identity: config.identity.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<C, D>(config: &GatewayConfig, state: AppState<C, D>) -> Router
    where
        C: Send + 'static,
        D: Dispatcher<C>,
    {
        Router::new()
            .fallback(gateway_handler::<C, D>)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point: every method and path goes through the gateway.
async fn gateway_handler<C, D>(State(state): State<AppState<C, D>>, request: Request<Body>) -> Response
where
    C: Send + 'static,
    D: Dispatcher<C>,
{
    let gateway_request = match decode_request(request, &state.identity, state.max_body_bytes).await {
        Ok(r) => r,
        Err(response) => return response.into_response(),
    };
    state.gateway.handle(gateway_request).await.into_response()
}

/// Convert an axum request into the transport-neutral form.
pub async fn decode_request(
    request: Request<Body>,
    identity: &IdentityConfig,
    max_body_bytes: usize,
) -> Result<GatewayRequest, GatewayResponse> {
    let (parts, body) = request.into_parts();

    let query: HashMap<String, String> = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let body = axum::body::to_bytes(body, max_body_bytes).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read request body");
        GatewayResponse::error(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large", e.to_string())
    })?;

    let identity = match parts.extensions.get::<IdentitySources>() {
        Some(sources) => sources.clone(),
        None => identity_from_headers(&parts.headers, identity),
    };

    Ok(GatewayRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        query,
        body,
        identity,
    })
}

/// Read identity sources from headers set by a trusted upstream authorizer.
///
/// Headers that are missing or not JSON objects are ignored.
pub fn identity_from_headers(headers: &HeaderMap, config: &IdentityConfig) -> IdentitySources {
    let token_claims = config
        .claims_header
        .as_deref()
        .and_then(|name| json_object_header(headers, name))
        .map(|object| {
            object
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::Null => None,
                    Value::String(s) => Some((k, s)),
                    other => Some((k, other.to_string())),
                })
                .collect::<ClaimMap>()
        });

    let authorizer_context = config
        .context_header
        .as_deref()
        .and_then(|name| json_object_header(headers, name))
        .map(|object| {
            object
                .into_iter()
                .map(|(k, v)| (k, ContextValue::from_json(&v)))
                .collect::<HashMap<_, _>>()
        });

    IdentitySources {
        token_claims,
        authorizer_context,
    }
}

fn json_object_header(headers: &HeaderMap, name: &str) -> Option<serde_json::Map<String, Value>> {
    let raw = headers.get(name)?.to_str().ok()?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Some(object),
        _ => {
            tracing::warn!(header = %name, "Ignoring identity header that is not a JSON object");
            None
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_config() -> IdentityConfig {
        IdentityConfig {
            claims_header: Some("x-authorizer-claims".into()),
            context_header: Some("x-authorizer-context".into()),
        }
    }

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-authorizer-claims", r#"{"sub":"u1","exp":1700000000}"#.parse().unwrap());
        headers.insert("x-authorizer-context", r#"{"admin":true,"gone":null}"#.parse().unwrap());

        let sources = identity_from_headers(&headers, &identity_config());
        let claims = sources.token_claims.unwrap();
        assert_eq!(claims["sub"], "u1");
        assert_eq!(claims["exp"], "1700000000");

        let context = sources.authorizer_context.unwrap();
        assert_eq!(context["admin"], ContextValue::Bool(true));
        assert_eq!(context["gone"], ContextValue::Null);
    }

    #[test]
    fn test_identity_headers_ignored_when_not_configured() {
        let mut headers = HeaderMap::new();
        headers.insert("x-authorizer-claims", r#"{"sub":"u1"}"#.parse().unwrap());

        let sources = identity_from_headers(&headers, &IdentityConfig::default());
        assert!(sources.token_claims.is_none());
        assert!(sources.authorizer_context.is_none());
    }

    #[test]
    fn test_malformed_identity_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-authorizer-claims", "not json".parse().unwrap());
        let sources = identity_from_headers(&headers, &identity_config());
        assert!(sources.token_claims.is_none());
    }

    #[tokio::test]
    async fn test_decode_request() {
        let request = Request::builder()
            .method("PUT")
            .uri("/items/Abc?expand=true&tag=a%20b")
            .body(Body::from(r#"{"name":"widget"}"#))
            .unwrap();

        let decoded = decode_request(request, &IdentityConfig::default(), 1024).await.unwrap();
        assert_eq!(decoded.method, "PUT");
        assert_eq!(decoded.path, "/items/Abc");
        assert_eq!(decoded.query["expand"], "true");
        assert_eq!(decoded.query["tag"], "a b");
        assert_eq!(&decoded.body[..], br#"{"name":"widget"}"#);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let request = Request::builder()
            .uri("/items")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let err = decode_request(request, &IdentityConfig::default(), 16).await.unwrap_err();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
