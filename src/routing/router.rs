//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching a path and method
//! - Return the matched route with its parameters, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in registration order: the first match wins regardless
//!   of how specific later routes are
//! - Explicit `None` rather than a silent default route

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::error::AppError;
use crate::http::request::RouteRequest;
use crate::http::response::Reply;
use crate::routing::matcher::{PathParams, PathPattern};

/// Future returned by a route handler.
pub type RouteFuture = BoxFuture<'static, Result<Reply, AppError>>;

/// A type-erased route handler.
pub type RouteHandler = Arc<dyn Fn(RouteRequest) -> RouteFuture + Send + Sync>;

/// A compiled route: pattern, allowed methods and handler.
#[derive(Clone)]
pub struct Route {
    pattern: PathPattern,
    methods: Vec<Method>,
    handler: RouteHandler,
}

impl Route {
    pub fn new(pattern: &str, methods: &[Method], handler: RouteHandler) -> Self {
        Self {
            pattern: PathPattern::compile(pattern),
            methods: methods.to_vec(),
            handler,
        }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Find the first route, in registration order, that matches both the
    /// path and the method.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            if !route.allows(method) {
                return None;
            }
            route
                .pattern
                .matches(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
