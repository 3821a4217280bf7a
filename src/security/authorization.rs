//! Authorization policy engine.
//!
//! # Responsibilities
//! - Evaluate a route's requirement against the request claims
//! - Resolve named policies through the registry
//! - Produce an allow/deny decision with a diagnostic reason
//!
//! # Evaluation Order
//! ```text
//! allow_anonymous            → allow
//! needs identity, no claims  → deny "not authenticated"
//! inline roles               → any recognized role claim intersects
//! inline claims              → every claim type present (and value-matched)
//! named policies             → each policy's roles, claims, predicates
//! ```
//!
//! # Design Decisions
//! - First failing step returns immediately
//! - Comparisons of roles and claim values ignore case
//! - Reasons are for logs only; 401 vs 403 is decided by the caller

use std::collections::{BTreeMap, BTreeSet};

use crate::http::request::RequestContext;
use crate::security::claims::ClaimMap;
use crate::security::policy::{Policy, PolicyRegistry};
use crate::security::requirement::AuthorizationRequirement;

/// Claim types that may carry role names, in lookup order.
pub const ROLE_CLAIM_TYPES: [&str; 4] = ["role", "roles", "cognito:groups", "groups"];

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    succeeded: bool,
    reason: Option<String>,
}

impl AuthorizationDecision {
    pub fn allow() -> Self {
        Self {
            succeeded: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.succeeded
    }

    /// Why the check failed; `None` on success.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Evaluates requirements against a fixed policy registry.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationService {
    policies: PolicyRegistry,
}

impl AuthorizationService {
    pub fn new(policies: PolicyRegistry) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Authorize a bare claim map. Policy predicates see a context holding only these claims.
    pub fn authorize(&self, claims: &ClaimMap, requirement: &AuthorizationRequirement) -> AuthorizationDecision {
        self.authorize_request(&RequestContext::from_claims(claims.clone()), requirement)
    }

    /// Authorize a full request context.
    pub fn authorize_request(
        &self,
        ctx: &RequestContext,
        requirement: &AuthorizationRequirement,
    ) -> AuthorizationDecision {
        if requirement.allows_anonymous() {
            return AuthorizationDecision::allow();
        }

        if requirement.needs_identity() && ctx.claims.is_empty() {
            return AuthorizationDecision::deny("not authenticated");
        }

        if let Err(reason) = check_roles(&ctx.claims, requirement.roles()) {
            return AuthorizationDecision::deny(reason);
        }

        if let Err(reason) = check_claims(&ctx.claims, requirement.claims()) {
            return AuthorizationDecision::deny(reason);
        }

        for name in requirement.policies() {
            let Some(policy) = self.policies.get(name) else {
                return AuthorizationDecision::deny(format!("policy '{}' not found", name));
            };
            if let Err(reason) = check_policy(ctx, policy) {
                return AuthorizationDecision::deny(format!("policy '{}' failed: {}", name, reason));
            }
        }

        AuthorizationDecision::allow()
    }
}

fn check_policy(ctx: &RequestContext, policy: &Policy) -> Result<(), String> {
    check_roles(&ctx.claims, policy.roles())?;
    check_claims(&ctx.claims, policy.claims())?;
    for (index, predicate) in policy.predicates().iter().enumerate() {
        if !predicate(ctx) {
            return Err(format!("custom requirement #{} not satisfied", index + 1));
        }
    }
    Ok(())
}

fn check_roles(claims: &ClaimMap, required: &BTreeSet<String>) -> Result<(), String> {
    if required.is_empty() {
        return Ok(());
    }

    let satisfied = ROLE_CLAIM_TYPES
        .iter()
        .filter_map(|claim_type| claims.get(*claim_type))
        .any(|raw| intersects(role_tokens(raw), required));

    if satisfied {
        Ok(())
    } else {
        Err(format!("missing required role (one of: {})", join(required)))
    }
}

fn check_claims(claims: &ClaimMap, required: &BTreeMap<String, BTreeSet<String>>) -> Result<(), String> {
    for (claim_type, accepted) in required {
        let Some(raw) = claims.get(claim_type) else {
            return Err(format!("missing required claim '{}'", claim_type));
        };
        if !accepted.is_empty() && !intersects(claim_tokens(raw), accepted) {
            return Err(format!(
                "claim '{}' has none of the required values ({})",
                claim_type,
                join(accepted)
            ));
        }
    }
    Ok(())
}

/// Split a role claim into role names.
///
/// Accepts JSON-array text (`["a","b"]`) as well as comma and/or space
/// separated lists.
pub fn role_tokens(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let list = if raw.starts_with('[') {
        raw.replace(['[', ']', '"', '\''], "")
    } else {
        raw.to_string()
    };
    claim_tokens(&list)
}

/// Split a claim value on commas and/or whitespace, dropping stray quotes.
pub fn claim_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn intersects(tokens: Vec<String>, accepted: &BTreeSet<String>) -> bool {
    tokens
        .iter()
        .any(|token| accepted.iter().any(|a| a.to_lowercase() == token.to_lowercase()))
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
