//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use command_gateway::config::GatewaySettings;
use command_gateway::security::{ClaimMap, ContextValue, IdentitySources};
use command_gateway::{DispatchError, Dispatcher, Gateway, PolicyRegistry, ResponseShape, RouteTable};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Commands understood by the in-memory test application.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ListItems,
    GetItem { id: String },
    CreateItem { name: String },
    DeleteItem { id: String },
    GetClient { realm: String, client: String },
    Whoami { claims: ClaimMap },
    Fail(DispatchError),
}

#[derive(Deserialize)]
struct CreateItemBody {
    name: String,
}

/// Dispatcher that records every command and answers from memory.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    sent: Arc<Mutex<Vec<Command>>>,
}

impl InMemoryDispatcher {
    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

impl Dispatcher<Command> for InMemoryDispatcher {
    async fn send(&self, command: Command) -> Result<Value, DispatchError> {
        self.sent.lock().unwrap().push(command.clone());
        match command {
            Command::ListItems => Ok(json!([{"id": "1"}, {"id": "2"}])),
            Command::GetItem { id } => Ok(json!({"id": id})),
            Command::CreateItem { name } => Ok(json!({"id": "3", "name": name})),
            Command::DeleteItem { .. } => Ok(Value::Null),
            Command::GetClient { realm, client } => Ok(json!({"realm": realm, "client": client})),
            Command::Whoami { claims } => Ok(json!(claims)),
            Command::Fail(err) => Err(err),
        }
    }
}

/// Policies used by the sample routes.
pub fn sample_policies() -> PolicyRegistry {
    let mut registry = PolicyRegistry::new();
    registry
        .add_policy("ItemAdmin", |p| p.require_role(["Admin"]).require_claim("scope", ["items:write"]))
        .unwrap();
    registry
        .add_policy("InternalCaller", |p| {
            p.require_assertion(|ctx| ctx.header("x-internal") == Some("yes"))
        })
        .unwrap();
    registry
}

/// The route table of the sample application.
pub fn sample_routes() -> RouteTable<Command> {
    let mut routes = RouteTable::new();

    routes.map_get("/items", |_| Ok(Command::ListItems)).unwrap().allow_anonymous();

    routes
        .map_get("/items/{id}", |ctx| {
            Ok(Command::GetItem {
                id: ctx.require_param("id")?.to_string(),
            })
        })
        .unwrap();

    routes
        .map("POST", "/items", ResponseShape::Created, |ctx| {
            let body: CreateItemBody = ctx.json()?;
            Ok(Command::CreateItem { name: body.name })
        })
        .unwrap()
        .require_role(["Admin"]);

    routes
        .map("DELETE", "/items/{id}", ResponseShape::NoContent, |ctx| {
            Ok(Command::DeleteItem {
                id: ctx.require_param("id")?.to_string(),
            })
        })
        .unwrap()
        .require_policy("ItemAdmin");

    routes
        .map_get("/realms/{realmId}/clients/{clientId}", |ctx| {
            Ok(Command::GetClient {
                realm: ctx.require_param("realmId")?.to_string(),
                client: ctx.require_param("clientId")?.to_string(),
            })
        })
        .unwrap()
        .require_claim("scope", ["client:read", "client:write"])
        .produces_content_type("application/vnd.api+json")
        .with_response_header("X-Resource", "client");

    routes
        .map_get("/me", |ctx| Ok(Command::Whoami { claims: ctx.claims.clone() }))
        .unwrap();

    routes
        .map_get("/internal/stats", |_| Ok(Command::ListItems))
        .unwrap()
        .require_policy("InternalCaller");

    routes
        .map_get("/reports", |_| Ok(Command::ListItems))
        .unwrap()
        .require_policy("Undefined");

    routes
        .map_post("/fail/{kind}", |ctx| {
            let message = ctx.query("message").unwrap_or("boom").to_string();
            Ok(Command::Fail(match ctx.require_param("kind")? {
                "validation" => DispatchError::Validation(message),
                "notfound" => DispatchError::NotFound(message),
                "unauthorized" => DispatchError::Unauthorized(message),
                "forbidden" => DispatchError::Forbidden(message),
                "conflict" => DispatchError::Conflict(message),
                _ => DispatchError::Other(message),
            }))
        })
        .unwrap()
        .allow_anonymous();

    routes
}

pub fn sample_settings() -> GatewaySettings {
    GatewaySettings {
        function_name: "items-api".to_string(),
        environment: "test".to_string(),
        stage_prefix: Some("/prod".to_string()),
        redact_internal_errors: false,
    }
}

/// Build the sample gateway with a fresh recording dispatcher.
pub fn sample_gateway(settings: GatewaySettings) -> (Gateway<Command, InMemoryDispatcher>, InMemoryDispatcher) {
    let dispatcher = InMemoryDispatcher::default();
    let gateway = Gateway::new(sample_routes(), sample_policies(), dispatcher.clone(), settings);
    (gateway, dispatcher)
}

/// Claim map from literal pairs.
pub fn claims(pairs: &[(&str, &str)]) -> ClaimMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Identity carrying token claims.
pub fn token(pairs: &[(&str, &str)]) -> IdentitySources {
    IdentitySources::from_token_claims(claims(pairs))
}

/// Identity carrying an authorizer context.
pub fn context(pairs: &[(&str, ContextValue)]) -> IdentitySources {
    IdentitySources::from_authorizer_context(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
}

/// A mock backend listening on an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}/commands", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a programmable backend. `respond` gets the zero-based call index and
/// the decoded command and returns the status and body to send back.
pub async fn start_programmable_backend<F>(respond: F) -> MockBackend
where
    F: Fn(usize, &Value) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let hits = Arc::new(AtomicUsize::new(0));
    let respond = Arc::new(respond);

    let app = {
        let received = received.clone();
        let hits = hits.clone();
        Router::new().route(
            "/commands",
            post(move |body: Bytes| {
                let received = received.clone();
                let hits = hits.clone();
                let respond = respond.clone();
                async move {
                    let command: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    let index = hits.fetch_add(1, Ordering::SeqCst);
                    received.lock().unwrap().push(command.clone());
                    let (status, body) = respond(index, &command);
                    (StatusCode::from_u16(status).unwrap(), body)
                }
            }),
        )
    };

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, received, hits }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
