//! Backend command dispatch over HTTP.
//!
//! # Responsibilities
//! - Turn a configured route into a serializable command
//! - POST the command to the backend with a per-attempt timeout
//! - Retry when the backend never saw the command
//! - Map backend status codes back into `DispatchError` kinds

use std::collections::BTreeMap;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::Value;

use crate::config::{BackendConfig, RetryConfig};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::http::request::RequestContext;
use crate::observability::metrics;
use crate::resilience::{is_retryable, Backoff};

/// Largest backend response body accepted.
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Command produced by routes declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfiguredCommand {
    pub command: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Value,
    pub claims: BTreeMap<String, String>,
}

impl ConfiguredCommand {
    /// Capture the request under the given command name.
    ///
    /// An empty body becomes `null`; a body that is not JSON is rejected.
    pub fn from_request(command: &str, ctx: &RequestContext) -> Result<Self, DispatchError> {
        let body = if ctx.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            ctx.json()?
        };

        Ok(Self {
            command: command.to_string(),
            params: ctx.params.clone().into_iter().collect(),
            query: ctx.query.clone().into_iter().collect(),
            body,
            claims: ctx.claims.clone().into_iter().collect(),
        })
    }
}

enum AttemptError {
    Connect(String),
    Transport(String),
    Timeout,
}

/// Sends `ConfiguredCommand`s to a backend URL.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
    timeout: Duration,
    max_attempts: u32,
    backoff: Backoff,
}

impl HttpDispatcher {
    pub fn new(backend: &BackendConfig, retries: &RetryConfig) -> Result<Self, axum::http::uri::InvalidUri> {
        let endpoint: Uri = backend.url.parse()?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            endpoint,
            timeout: Duration::from_secs(backend.timeout_secs),
            max_attempts: if retries.enabled { retries.max_attempts.max(1) } else { 1 },
            backoff: Backoff::from_config(retries),
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    async fn attempt(&self, payload: Bytes) -> Result<(StatusCode, Bytes), AttemptError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let sent = tokio::time::timeout(self.timeout, self.client.request(request)).await;
        let response: Response<Incoming> = match sent {
            Err(_) => return Err(AttemptError::Timeout),
            Ok(Err(e)) if e.is_connect() => return Err(AttemptError::Connect(e.to_string())),
            Ok(Err(e)) => return Err(AttemptError::Transport(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        Ok((status, body))
    }
}

impl Dispatcher<ConfiguredCommand> for HttpDispatcher {
    async fn send(&self, command: ConfiguredCommand) -> Result<Value, DispatchError> {
        let payload = serde_json::to_vec(&command)
            .map(Bytes::from)
            .map_err(|e| DispatchError::Other(format!("failed to encode command: {}", e)))?;

        let mut attempts = 0;
        loop {
            attempts += 1;

            let (status, connection_failed, outcome) = match self.attempt(payload.clone()).await {
                Ok((status, body)) => (Some(status), false, Ok((status, body))),
                Err(AttemptError::Connect(e)) => (None, true, Err(format!("backend unreachable: {}", e))),
                Err(AttemptError::Transport(e)) => (None, false, Err(format!("backend request failed: {}", e))),
                Err(AttemptError::Timeout) => (None, false, Err("backend timed out".to_string())),
            };

            if attempts < self.max_attempts && is_retryable(status, connection_failed) {
                let delay = self.backoff.delay(attempts);
                tracing::info!(
                    command = %command.command,
                    attempt = attempts,
                    delay = ?delay,
                    status = ?status,
                    "Retrying command"
                );
                metrics::record_dispatch_retry(&command.command);
                tokio::time::sleep(delay).await;
                continue;
            }

            return match outcome {
                Ok((status, body)) => classify(status, &body),
                Err(message) => Err(DispatchError::Other(message)),
            };
        }
    }
}

/// Map a backend response onto a result.
fn classify(status: StatusCode, body: &[u8]) -> Result<Value, DispatchError> {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    if status.is_success() {
        return Ok(match parsed {
            Some(value) => value,
            None if body.is_empty() => Value::Null,
            None => Value::String(String::from_utf8_lossy(body).into_owned()),
        });
    }

    let message = parsed
        .as_ref()
        .and_then(|v| ["details", "error", "message"].iter().find_map(|k| v.get(*k)?.as_str()))
        .map(str::to_string)
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("backend error").to_string());

    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => DispatchError::Validation(message),
        StatusCode::UNAUTHORIZED => DispatchError::Unauthorized(message),
        StatusCode::FORBIDDEN => DispatchError::Forbidden(message),
        StatusCode::NOT_FOUND => DispatchError::NotFound(message),
        StatusCode::CONFLICT => DispatchError::Conflict(message),
        _ => DispatchError::Other(message),
    })
}
