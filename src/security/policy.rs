//! Named authorization policies.
//!
//! # Responsibilities
//! - Describe reusable role / claim / predicate bundles
//! - Register them once at startup under unique names
//!
//! # Design Decisions
//! - Roles: any one suffices
//! - Claims: every claim type must pass; within a type any listed value suffices
//! - Predicates: all must hold
//! - Registering a name twice is a configuration error

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::http::request::RequestContext;

/// Custom check over the full request context.
pub type Predicate = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy '{0}' is already registered")]
pub struct DuplicatePolicyError(pub String);

/// A named bundle of requirements.
#[derive(Clone)]
pub struct Policy {
    name: String,
    roles: BTreeSet<String>,
    claims: BTreeMap<String, BTreeSet<String>>,
    predicates: Vec<Predicate>,
}

impl Policy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn claims(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.claims
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("name", &self.name)
            .field("roles", &self.roles)
            .field("claims", &self.claims)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

/// Builder handed to `PolicyRegistry::add_policy`.
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    fn new(name: &str) -> Self {
        Self {
            policy: Policy {
                name: name.to_string(),
                roles: BTreeSet::new(),
                claims: BTreeMap::new(),
                predicates: Vec::new(),
            },
        }
    }

    pub fn require_role<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Require a claim type; no values means presence is enough.
    pub fn require_claim<I, S>(mut self, claim_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy
            .claims
            .entry(claim_type.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn require_assertion<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.policy.predicates.push(Arc::new(predicate));
        self
    }

    fn build(self) -> Policy {
        self.policy
    }
}

/// Process-wide policy table, populated at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, Policy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy built by `configure`.
    pub fn add_policy<F>(&mut self, name: &str, configure: F) -> Result<(), DuplicatePolicyError>
    where
        F: FnOnce(PolicyBuilder) -> PolicyBuilder,
    {
        if self.policies.contains_key(name) {
            return Err(DuplicatePolicyError(name.to_string()));
        }
        let policy = configure(PolicyBuilder::new(name)).build();
        tracing::debug!(policy = %name, roles = policy.roles.len(), claims = policy.claims.len(), "Policy registered");
        self.policies.insert(name.to_string(), policy);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
