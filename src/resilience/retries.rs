//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failed backend call may be attempted again
//!
//! # Design Decisions
//! - Commands are not idempotent in general, so only outcomes where the
//!   backend never processed the command are retried
//! - Connection failures, 502 and 503 qualify; 504 and other 5xx do not

use axum::http::StatusCode;

/// `status` is `None` when no response was received.
pub fn is_retryable(status: Option<StatusCode>, connection_failed: bool) -> bool {
    if connection_failed {
        return true;
    }
    matches!(
        status,
        Some(StatusCode::BAD_GATEWAY) | Some(StatusCode::SERVICE_UNAVAILABLE)
    )
}
