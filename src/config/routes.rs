//! Declarative routes and policies.
//!
//! Registers `[[policies]]` and `[[routes]]` through the same fluent API used
//! for code-defined routes, so both behave identically.

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::dispatch::ConfiguredCommand;
use crate::routing::{MalformedTemplateError, RouteTable};
use crate::security::{DuplicatePolicyError, PolicyRegistry};

/// Configuration-time wiring failure.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Template(#[from] MalformedTemplateError),

    #[error(transparent)]
    Policy(#[from] DuplicatePolicyError),
}

/// Register every configured policy.
pub fn build_policies(config: &GatewayConfig) -> Result<PolicyRegistry, BuildError> {
    let mut registry = PolicyRegistry::new();
    for policy in &config.policies {
        registry.add_policy(&policy.name, |mut builder| {
            builder = builder.require_role(policy.roles.iter().cloned());
            for (claim_type, values) in &policy.claims {
                builder = builder.require_claim(claim_type.clone(), values.iter().cloned());
            }
            builder
        })?;
    }
    Ok(registry)
}

/// Register every configured route, in file order.
pub fn build_routes(config: &GatewayConfig) -> Result<RouteTable<ConfiguredCommand>, BuildError> {
    let mut table = RouteTable::new();
    for route in &config.routes {
        let command = route.command.clone();
        let mut builder = table.map(&route.method, &route.path, route.response, move |ctx| {
            ConfiguredCommand::from_request(&command, ctx)
        })?;

        if !route.roles.is_empty() {
            builder = builder.require_role(route.roles.iter().cloned());
        }
        for (claim_type, values) in &route.claims {
            builder = builder.require_claim(claim_type.clone(), values.iter().cloned());
        }
        for policy in &route.policies {
            builder = builder.require_policy(policy.clone());
        }
        if let Some(content_type) = &route.content_type {
            builder = builder.produces_content_type(content_type.clone());
        }
        for (name, value) in &route.headers {
            builder = builder.with_response_header(name, value.clone());
        }
        if route.allow_anonymous {
            builder.allow_anonymous();
        }
    }
    Ok(table)
}
