//! Claim extraction.
//!
//! # Responsibilities
//! - Collapse the two identity sources into one string-keyed claim map
//! - Coerce authorizer-context scalars to their canonical text
//!
//! # Design Decisions
//! - Token claims, when present and non-empty, are used exclusively
//! - Null authorizer-context entries are dropped
//! - Booleans render as `True`/`False`; downstream consumers compare on that text

use std::collections::HashMap;

use serde_json::Value;

/// Per-request claims, keyed exactly as the identity source provided them.
pub type ClaimMap = HashMap<String, String>;

/// A scalar from a generic authorizer context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    /// Nested structure, kept as its compact JSON text.
    Raw(String),
}

impl ContextValue {
    /// Convert a JSON value without recursing into arrays or objects.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Unsigned(u)
                } else {
                    n.as_f64().map(Self::Float).unwrap_or_else(|| Self::Raw(n.to_string()))
                }
            }
            Value::String(s) => Self::String(s.clone()),
            other => Self::Raw(other.to_string()),
        }
    }

    /// Canonical claim text, or `None` for null.
    pub fn to_claim_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(true) => Some("True".to_string()),
            Self::Bool(false) => Some("False".to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Unsigned(u) => Some(u.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) | Self::Raw(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for ContextValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Identity data handed over by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct IdentitySources {
    /// Claims from a validated token.
    pub token_claims: Option<ClaimMap>,
    /// Generic authorizer context.
    pub authorizer_context: Option<HashMap<String, ContextValue>>,
}

impl IdentitySources {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_token_claims(claims: ClaimMap) -> Self {
        Self {
            token_claims: Some(claims),
            authorizer_context: None,
        }
    }

    pub fn from_authorizer_context(context: HashMap<String, ContextValue>) -> Self {
        Self {
            token_claims: None,
            authorizer_context: Some(context),
        }
    }
}

/// Build the canonical claim map for one request.
pub fn build_claims(sources: &IdentitySources) -> ClaimMap {
    if let Some(claims) = sources.token_claims.as_ref().filter(|c| !c.is_empty()) {
        return claims.clone();
    }

    match &sources.authorizer_context {
        Some(context) => context
            .iter()
            .filter_map(|(key, value)| value.to_claim_value().map(|v| (key.clone(), v)))
            .collect(),
        None => ClaimMap::new(),
    }
}
