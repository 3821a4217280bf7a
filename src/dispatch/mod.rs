//! Command dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Matched + authorized route
//!     → CommandFactory (RequestContext → command)
//!     → Dispatcher::send(command)
//!     → JSON value or classified DispatchError
//! ```
//!
//! # Design Decisions
//! - Commands are an application-defined type `C`, usually an enum of known commands
//! - Failures carry a kind so the boundary can pick a status code
//! - `http.rs` forwards configured commands to a backend service

pub mod http;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub use self::http::{ConfiguredCommand, HttpDispatcher};

/// Failures raised while building or executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Conflict(m)
            | Self::Other(m) => m,
        }
    }
}

/// Executes commands. Implemented once per command type.
pub trait Dispatcher<C>: Send + Sync + 'static {
    fn send(&self, command: C) -> impl Future<Output = Result<Value, DispatchError>> + Send;
}
