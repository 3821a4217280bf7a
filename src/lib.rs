//! Command gateway library.
//!
//! Routes HTTP-style requests to application-defined commands: path templates
//! are matched in registration order, the caller's claims are checked against
//! the route's authorization requirement, and the bound command is handed to a
//! `Dispatcher`.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use dispatch::{DispatchError, Dispatcher};
pub use http::{Gateway, GatewayRequest, GatewayResponse, HttpServer, RequestContext};
pub use routing::{ResponseShape, RouteMatcher, RouteTable};
pub use security::{AuthorizationRequirement, AuthorizationService, IdentitySources, PolicyRegistry};
