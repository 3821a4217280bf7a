//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! GatewayRequest
//!     → health path?            → 200 health payload
//!     → strip stage prefix
//!     → build_claims(identity)
//!     → RouteMatcher::match_route → none → 404 {error, path, method}
//!     → AuthorizationService     → deny → 401 (no claims) / 403 (claims)
//!     → CommandFactory           → DispatchError → mapped status
//!     → Dispatcher::send         → ResponseShape status + route headers
//! ```
//!
//! # Design Decisions
//! - Every outcome becomes a `GatewayResponse`; nothing escapes as an error
//! - Route table and policy registry are shared read-only across requests

use std::time::Instant;

use axum::http::header;

use crate::config::GatewaySettings;
use crate::dispatch::Dispatcher;
use crate::http::health::{health_response, is_health_path};
use crate::http::request::{strip_stage_prefix, GatewayRequest, RequestContext};
use crate::http::response::GatewayResponse;
use crate::observability::metrics;
use crate::routing::{ResponseShape, RouteMatcher, RouteTable};
use crate::security::{build_claims, AuthorizationService, PolicyRegistry};

/// Matches, authorizes and dispatches requests for command type `C`.
pub struct Gateway<C, D> {
    matcher: RouteMatcher<C>,
    authorization: AuthorizationService,
    dispatcher: D,
    settings: GatewaySettings,
}

impl<C, D> Gateway<C, D>
where
    C: Send + 'static,
    D: Dispatcher<C>,
{
    pub fn new(routes: RouteTable<C>, policies: PolicyRegistry, dispatcher: D, settings: GatewaySettings) -> Self {
        tracing::info!(
            routes = routes.len(),
            policies = policies.len(),
            function = %settings.function_name,
            "Gateway initialized"
        );
        Self {
            matcher: RouteMatcher::new(routes),
            authorization: AuthorizationService::new(policies),
            dispatcher,
            settings,
        }
    }

    pub fn matcher(&self) -> &RouteMatcher<C> {
        &self.matcher
    }

    pub fn authorization(&self) -> &AuthorizationService {
        &self.authorization
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Process one request end to end.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let start = Instant::now();
        let method = request.method.trim().to_uppercase();
        let path = match &self.settings.stage_prefix {
            Some(prefix) => strip_stage_prefix(&request.path, prefix),
            None => request.path.clone(),
        };

        if is_health_path(&path) {
            let response = health_response(&self.settings.function_name, &self.settings.environment);
            metrics::record_request(&method, "health", response.status.as_u16(), start);
            return response;
        }

        let claims = build_claims(&request.identity);

        let Some(found) = self.matcher.match_route(&method, &path) else {
            tracing::warn!(method = %method, path = %path, "No route matched");
            let response = GatewayResponse::route_not_found(&path, &method);
            metrics::record_request(&method, "none", response.status.as_u16(), start);
            return response;
        };

        let route = found.route;
        let route_label = route.template().raw();
        tracing::debug!(method = %method, path = %path, route = %route_label, "Route matched");

        let ctx = RequestContext {
            method: method.clone(),
            path: path.clone(),
            params: found.params,
            query: request.query,
            headers: request.headers,
            body: request.body,
            claims,
        };

        let decision = self.authorization.authorize_request(&ctx, route.authorization());
        if !decision.is_allowed() {
            let reason = decision.reason().unwrap_or("access denied");
            let response = if ctx.claims.is_empty() {
                metrics::record_authorization_denied("unauthenticated");
                GatewayResponse::unauthenticated(reason)
            } else {
                metrics::record_authorization_denied("forbidden");
                GatewayResponse::forbidden(reason)
            };
            tracing::warn!(
                method = %method,
                path = %path,
                route = %route_label,
                status = response.status.as_u16(),
                reason = %reason,
                "Authorization denied"
            );
            metrics::record_request(&method, route_label, response.status.as_u16(), start);
            return response;
        }

        let result = match route.build_command(&ctx) {
            Ok(command) => self.dispatcher.send(command).await,
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(value) => {
                let mut response = match route.response() {
                    ResponseShape::NoContent => GatewayResponse::empty(route.response().status()),
                    shape => GatewayResponse::json(shape.status(), value),
                };
                if let Some(content_type) = route.content_type() {
                    response = response.with_header(header::CONTENT_TYPE.as_str(), content_type);
                }
                for (name, value) in route.response_headers() {
                    response = response.with_header(name, value);
                }
                response
            }
            Err(e) => {
                let response = GatewayResponse::from_dispatch_error(&e, self.settings.redact_internal_errors);
                if response.status.is_server_error() {
                    tracing::error!(route = %route_label, error = %e, "Command failed");
                } else {
                    tracing::debug!(route = %route_label, error = %e, "Command rejected");
                }
                response
            }
        };

        metrics::record_request(&method, route_label, response.status.as_u16(), start);
        response
    }
}
