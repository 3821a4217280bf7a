//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → server.rs (request ID, tracing, timeout; decode into GatewayRequest)
//!     → pipeline.rs (health bypass, claims, match, authorize, dispatch)
//!     → response.rs (status table, error payloads)
//!     → Send to client
//! ```

pub mod health;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::Gateway;
pub use request::{GatewayRequest, RequestContext};
pub use response::GatewayResponse;
pub use server::HttpServer;
