//! Tests of the assembled axum router, middleware included.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use command_gateway::config::IdentityConfig;
use command_gateway::security::IdentitySources;
use command_gateway::{GatewayConfig, HttpServer};
use common::{claims, sample_gateway, sample_settings, Command};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> (Router, common::InMemoryDispatcher) {
    let mut config = GatewayConfig::default();
    config.gateway = sample_settings();
    config.identity = IdentityConfig {
        claims_header: Some("x-authorizer-claims".to_string()),
        context_header: Some("x-authorizer-context".to_string()),
    };
    config.listener.max_body_bytes = 1024;

    let (gateway, dispatcher) = sample_gateway(config.gateway.clone());
    let server = HttpServer::new(Arc::new(gateway), &config);
    (server.router(), dispatcher)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_through_router() {
    let (app, _) = router();

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_incoming_request_id_is_propagated() {
    let (app, _) = router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_identity_header_authenticates_caller() {
    let (app, dispatcher) = router();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/prod/items")
                .header("x-authorizer-claims", r#"{"sub":"u1","role":"Admin"}"#)
                .body(Body::from(r#"{"name":"widget"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"id": "3", "name": "widget"}));
    assert_eq!(dispatcher.sent(), vec![Command::CreateItem { name: "widget".into() }]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .body(Body::from(r#"{"name":"widget"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_context_header_with_boolean() {
    let (app, _) = router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("x-authorizer-context", r#"{"principalId":"u1","admin":false,"gone":null}"#)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"principalId": "u1", "admin": "False"}));
}

#[tokio::test]
async fn test_identity_extension_overrides_headers() {
    let (app, _) = router();

    let mut request = Request::builder()
        .uri("/me")
        .header("x-authorizer-claims", r#"{"sub":"from-header"}"#)
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(IdentitySources::from_token_claims(claims(&[("sub", "from-extension")])));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(body_json(response).await, json!({"sub": "from-extension"}));
}

#[tokio::test]
async fn test_query_string_reaches_factory() {
    let (app, _) = router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/fail/conflict?message=already%20exists")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Conflict", "details": "already exists"})
    );
}

#[tokio::test]
async fn test_custom_content_type_and_headers() {
    let (app, _) = router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/realms/master/clients/web")
                .header("x-authorizer-claims", r#"{"sub":"u1","scope":"client:write"}"#)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/vnd.api+json");
    assert_eq!(response.headers()["x-resource"], "client");
    assert_eq!(body_json(response).await, json!({"realm": "master", "client": "web"}));
}

#[tokio::test]
async fn test_no_content_has_empty_body() {
    let (app, _) = router();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/items/9")
                .header("x-authorizer-claims", r#"{"role":"Admin","scope":"items:write"}"#)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, dispatcher) = router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header("x-authorizer-claims", r#"{"role":"Admin"}"#)
                .body(Body::from(vec![b' '; 4096]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(dispatcher.sent().is_empty());
}
