//! Route registration.
//!
//! # Responsibilities
//! - Hold registered routes in registration order
//! - Offer fluent `map_*` registration with per-route configuration
//!
//! # Design Decisions
//! - Routes require authentication unless `allow_anonymous()` is called
//! - Identical method + path pairs are accepted; the first registered wins at match time
//! - The table is mutated only during startup, then frozen into a `RouteMatcher`

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchError;
use crate::http::request::RequestContext;
use crate::routing::template::{MalformedTemplateError, RouteTemplate};
use crate::security::requirement::AuthorizationRequirement;

/// Builds a command from the request context.
pub type CommandFactory<C> =
    Arc<dyn Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync>;

/// Declared response shape of a route; decides the success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    #[default]
    Ok,
    Created,
    Accepted,
    NoContent,
}

impl ResponseShape {
    pub fn status(self) -> StatusCode {
        match self {
            ResponseShape::Ok => StatusCode::OK,
            ResponseShape::Created => StatusCode::CREATED,
            ResponseShape::Accepted => StatusCode::ACCEPTED,
            ResponseShape::NoContent => StatusCode::NO_CONTENT,
        }
    }
}

/// A single registered endpoint.
pub struct RouteEntry<C> {
    method: String,
    template: RouteTemplate,
    factory: CommandFactory<C>,
    response: ResponseShape,
    authorization: AuthorizationRequirement,
    content_type: Option<String>,
    /// Lower-cased header names, in insertion order.
    headers: Vec<(String, String)>,
}

impl<C> RouteEntry<C> {
    /// Upper-cased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn response(&self) -> ResponseShape {
        self.response
    }

    pub fn authorization(&self) -> &AuthorizationRequirement {
        &self.authorization
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn response_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Run the bound factory.
    pub fn build_command(&self, ctx: &RequestContext) -> Result<C, DispatchError> {
        (self.factory)(ctx)
    }
}

impl<C> fmt::Debug for RouteEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("template", &self.template.raw())
            .field("response", &self.response)
            .field("authorization", &self.authorization)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of routes.
pub struct RouteTable<C> {
    routes: Vec<RouteEntry<C>>,
}

impl<C> RouteTable<C> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route and return a handle for configuring it.
    pub fn map<F>(
        &mut self,
        method: &str,
        path: &str,
        response: ResponseShape,
        factory: F,
    ) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        let template = RouteTemplate::compile(path)?;
        tracing::debug!(method = %method, path = %template.raw(), "Route registered");

        let index = self.routes.len();
        self.routes.push(RouteEntry {
            method: method.trim().to_uppercase(),
            template,
            factory: Arc::new(factory),
            response,
            authorization: AuthorizationRequirement::default(),
            content_type: None,
            headers: Vec::new(),
        });

        Ok(RouteBuilder {
            entry: &mut self.routes[index],
        })
    }

    pub fn map_get<F>(&mut self, path: &str, factory: F) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        self.map("GET", path, ResponseShape::Ok, factory)
    }

    pub fn map_post<F>(&mut self, path: &str, factory: F) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        self.map("POST", path, ResponseShape::Ok, factory)
    }

    pub fn map_put<F>(&mut self, path: &str, factory: F) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        self.map("PUT", path, ResponseShape::Ok, factory)
    }

    pub fn map_delete<F>(&mut self, path: &str, factory: F) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        self.map("DELETE", path, ResponseShape::Ok, factory)
    }

    pub fn map_patch<F>(&mut self, path: &str, factory: F) -> Result<RouteBuilder<'_, C>, MalformedTemplateError>
    where
        F: Fn(&RequestContext) -> Result<C, DispatchError> + Send + Sync + 'static,
    {
        self.map("PATCH", path, ResponseShape::Ok, factory)
    }

    pub fn routes(&self) -> &[RouteEntry<C>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<C> Default for RouteTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for RouteTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

/// Fluent handle onto the route that was just registered.
pub struct RouteBuilder<'a, C> {
    entry: &'a mut RouteEntry<C>,
}

impl<'a, C> RouteBuilder<'a, C> {
    /// Explicitly require an authenticated caller.
    pub fn require_authorization(self) -> Self {
        self.entry.authorization.require_authentication();
        self
    }

    /// Require a named policy from the registry.
    pub fn require_policy(self, name: impl Into<String>) -> Self {
        self.entry.authorization.require_policy(name);
        self
    }

    /// Accept callers holding any of these roles.
    pub fn require_role<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            self.entry.authorization.require_role(role);
        }
        self
    }

    /// Require a claim type; an empty value list means presence alone suffices.
    pub fn require_claim<I, S>(self, claim_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry.authorization.require_claim(claim_type, values);
        self
    }

    pub fn allow_anonymous(self) -> Self {
        self.entry.authorization.allow_anonymous();
        self
    }

    pub fn responds_with(self, response: ResponseShape) -> Self {
        self.entry.response = response;
        self
    }

    pub fn produces_content_type(self, content_type: impl Into<String>) -> Self {
        self.entry.content_type = Some(content_type.into());
        self
    }

    /// Add an extra response header. Names are case-insensitive; a repeated
    /// name replaces the earlier value.
    pub fn with_response_header(self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.entry.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.entry.headers.push((name, value)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(_: &RequestContext) -> Result<(), DispatchError> {
        Ok(())
    }

    #[test]
    fn test_registration_order_and_normalization() {
        let mut table = RouteTable::new();
        table.map_get("items", unit).unwrap();
        table.map("patch", "/items/{id}/", ResponseShape::NoContent, unit).unwrap();

        let routes = table.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].method(), "GET");
        assert_eq!(routes[0].template().normalized(), "/items");
        assert_eq!(routes[1].method(), "PATCH");
        assert_eq!(routes[1].response(), ResponseShape::NoContent);
    }

    #[test]
    fn test_routes_are_secure_by_default() {
        let mut table = RouteTable::new();
        table.map_get("/items", unit).unwrap();
        assert!(table.routes()[0].authorization().needs_identity());
        assert!(!table.routes()[0].authorization().allows_anonymous());
    }

    #[test]
    fn test_fluent_configuration() {
        let mut table = RouteTable::new();
        table
            .map_post("/clients", unit)
            .unwrap()
            .require_role(["Admin"])
            .require_claim("scope", ["client:write"])
            .require_policy("TenantMember")
            .responds_with(ResponseShape::Created)
            .produces_content_type("application/vnd.api+json")
            .with_response_header("X-Cache", "miss")
            .with_response_header("x-cache", "bypass");

        let route = &table.routes()[0];
        assert!(route.authorization().roles().contains("Admin"));
        assert!(route.authorization().claims().contains_key("scope"));
        assert_eq!(route.authorization().policies(), &["TenantMember".to_string()]);
        assert_eq!(route.response().status(), StatusCode::CREATED);
        assert_eq!(route.content_type(), Some("application/vnd.api+json"));
        assert_eq!(route.response_headers(), &[("x-cache".to_string(), "bypass".to_string())]);
    }

    #[test]
    fn test_malformed_template_fails_registration() {
        let mut table: RouteTable<()> = RouteTable::new();
        assert!(table.map_get("/a/{id}/{id}", unit).is_err());
        assert!(table.is_empty());
    }
}
