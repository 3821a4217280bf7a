//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → routes.rs (register [[policies]] and [[routes]])
//!     → frozen PolicyRegistry + RouteTable
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reconfiguration
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod routes;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use routes::{build_policies, build_routes, BuildError};
pub use schema::{
    BackendConfig, GatewayConfig, GatewaySettings, IdentityConfig, ListenerConfig, ObservabilityConfig,
    PolicyConfig, RetryConfig, RouteConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
