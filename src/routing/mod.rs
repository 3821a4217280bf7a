//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     map_get / map_post / ... (method, template, factory)
//!     → template.rs (normalize, compile parameter slots)
//!     → table.rs (append RouteEntry, configure via RouteBuilder)
//!     → Freeze as immutable RouteMatcher
//!
//! Incoming Request (method, path):
//!     → matcher.rs (scan in registration order)
//!     → Return: RouteMatch { route, params } or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod table;
pub mod template;

pub use matcher::{RouteMatch, RouteMatcher};
pub use table::{CommandFactory, ResponseShape, RouteBuilder, RouteEntry, RouteTable};
pub use template::{normalize_path, MalformedTemplateError, RouteTemplate};
