//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Command sent to backend:
//!     → per-attempt timeout (tokio::time::timeout in the dispatcher)
//!     → On failure: retries.rs (check if retryable)
//!     → backoff.rs (exponential delay with jitter before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Every backend call has a deadline
//! - Only failures where the backend cannot have run the command are retried
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::is_retryable;
