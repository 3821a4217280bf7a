//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing policies)
//! - Validate value ranges and formats (methods, templates, headers, backend URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::routing::RouteTemplate;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route {index}: unknown HTTP method '{method}'")]
    UnknownMethod { index: usize, method: String },

    #[error("route {index}: command name is empty")]
    EmptyCommand { index: usize },

    #[error("route {index}: {reason}")]
    InvalidTemplate { index: usize, reason: String },

    #[error("route {index}: references undefined policy '{policy}'")]
    UndefinedPolicy { index: usize, policy: String },

    #[error("route {index}: invalid response header '{header}'")]
    InvalidHeader { index: usize, header: String },

    #[error("policy '{0}' is defined more than once")]
    DuplicatePolicy(String),

    #[error("policy name is empty")]
    EmptyPolicyName,

    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("backend.url '{0}' is not a valid http URL")]
    InvalidBackendUrl(String),
}

const METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut policy_names = HashSet::new();
    for policy in &config.policies {
        if policy.name.trim().is_empty() {
            errors.push(ValidationError::EmptyPolicyName);
        } else if !policy_names.insert(policy.name.as_str()) {
            errors.push(ValidationError::DuplicatePolicy(policy.name.clone()));
        }
    }

    for (index, route) in config.routes.iter().enumerate() {
        let method = route.method.trim().to_uppercase();
        if !METHODS.contains(&method.as_str()) {
            errors.push(ValidationError::UnknownMethod {
                index,
                method: route.method.clone(),
            });
        }

        if route.command.trim().is_empty() {
            errors.push(ValidationError::EmptyCommand { index });
        }

        if let Err(e) = RouteTemplate::compile(&route.path) {
            errors.push(ValidationError::InvalidTemplate {
                index,
                reason: e.to_string(),
            });
        }

        for policy in &route.policies {
            if !policy_names.contains(policy.as_str()) {
                errors.push(ValidationError::UndefinedPolicy {
                    index,
                    policy: policy.clone(),
                });
            }
        }

        for (name, value) in &route.headers {
            if HeaderName::try_from(name.as_str()).is_err() || HeaderValue::try_from(value.as_str()).is_err() {
                errors.push(ValidationError::InvalidHeader {
                    index,
                    header: name.clone(),
                });
            }
        }
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if !config.routes.is_empty() {
        let valid = Url::parse(&config.backend.url)
            .map(|u| u.scheme() == "http")
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidBackendUrl(config.backend.url.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
