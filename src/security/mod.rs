//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Identity sources (token claims, authorizer context):
//!     → claims.rs (normalize into ClaimMap)
//!
//! Matched route:
//!     → requirement.rs (route's AuthorizationRequirement)
//!     → authorization.rs (evaluate, resolve policies via policy.rs)
//!     → AuthorizationDecision (allow / deny + reason)
//! ```
//!
//! # Design Decisions
//! - Secure by default: routes need an authenticated caller unless marked anonymous
//! - Fail closed: unknown policies deny
//! - Policy registry is built once and read-only afterwards

pub mod authorization;
pub mod claims;
pub mod policy;
pub mod requirement;

pub use authorization::{AuthorizationDecision, AuthorizationService, ROLE_CLAIM_TYPES};
pub use claims::{build_claims, ClaimMap, ContextValue, IdentitySources};
pub use policy::{DuplicatePolicyError, Policy, PolicyBuilder, PolicyRegistry, Predicate};
pub use requirement::AuthorizationRequirement;
