//! Per-route authorization requirements.

use std::collections::{BTreeMap, BTreeSet};

/// What a caller must present to reach a route.
///
/// Routes start out requiring authentication. `allow_anonymous` wins over
/// everything else when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequirement {
    policies: Vec<String>,
    roles: BTreeSet<String>,
    claims: BTreeMap<String, BTreeSet<String>>,
    allow_anonymous: bool,
    requires_authentication: bool,
}

impl AuthorizationRequirement {
    /// Requirement that only demands an authenticated caller.
    pub fn authenticated() -> Self {
        Self {
            policies: Vec::new(),
            roles: BTreeSet::new(),
            claims: BTreeMap::new(),
            allow_anonymous: false,
            requires_authentication: true,
        }
    }

    /// Requirement that lets every caller through.
    pub fn anonymous() -> Self {
        let mut requirement = Self::authenticated();
        requirement.allow_anonymous();
        requirement
    }

    pub fn allow_anonymous(&mut self) {
        self.allow_anonymous = true;
    }

    pub fn require_authentication(&mut self) {
        self.requires_authentication = true;
    }

    /// Reference a named policy. Referencing the same policy twice is a no-op.
    pub fn require_policy(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.policies.contains(&name) {
            self.policies.push(name);
        }
        self.requires_authentication = true;
    }

    /// Add an acceptable role. Any one of the accepted roles suffices.
    pub fn require_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
        self.requires_authentication = true;
    }

    /// Require a claim type, optionally restricted to a set of values.
    ///
    /// Calling this again for the same claim type widens its value set.
    pub fn require_claim<I, S>(&mut self, claim_type: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims
            .entry(claim_type.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self.requires_authentication = true;
    }

    pub fn allows_anonymous(&self) -> bool {
        self.allow_anonymous
    }

    /// True when any check beyond anonymous access applies.
    pub fn needs_identity(&self) -> bool {
        self.requires_authentication
            || !self.policies.is_empty()
            || !self.roles.is_empty()
            || !self.claims.is_empty()
    }

    pub fn policies(&self) -> &[String] {
        &self.policies
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn claims(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.claims
    }
}

impl Default for AuthorizationRequirement {
    fn default() -> Self {
        Self::authenticated()
    }
}
