//! Route matching logic.
//!
//! # Responsibilities
//! - Match method (case-insensitive) and path structure against each route
//! - Extract parameter values from the case-preserved request path
//! - Return the first matching route or an explicit no-match
//!
//! # Design Decisions
//! - Linear scan in registration order; first match wins
//! - Literal segments compare case-insensitively
//! - Parameter keys are lower-cased slot names, values keep request casing
//! - No prefix matches: segment counts must be equal

use std::collections::HashMap;
use std::fmt;

use crate::routing::table::{RouteEntry, RouteTable};
use crate::routing::template::normalize_path;

/// A successful match.
pub struct RouteMatch<'a, C> {
    pub route: &'a RouteEntry<C>,
    pub params: HashMap<String, String>,
}

impl<C> fmt::Debug for RouteMatch<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", self.route)
            .field("params", &self.params)
            .finish()
    }
}

/// Immutable matcher over a frozen route table.
///
/// Safe to share between concurrent requests without locking.
#[derive(Debug)]
pub struct RouteMatcher<C> {
    table: RouteTable<C>,
}

impl<C> RouteMatcher<C> {
    pub fn new(table: RouteTable<C>) -> Self {
        Self { table }
    }

    /// Find the first route registered for `method` whose template fits `path`.
    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_, C>> {
        let method = method.trim().to_uppercase();
        let path = normalize_path(path);

        self.table
            .routes()
            .iter()
            .filter(|route| route.method() == method)
            .find_map(|route| {
                route
                    .template()
                    .capture(&path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    pub fn routes(&self) -> &[RouteEntry<C>] {
        self.table.routes()
    }
}
