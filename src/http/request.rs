//! Request context handed to route handlers.
//!
//! # Responsibilities
//! - Carry method, path, headers and body of the resolved request
//! - Merge captured path parameters with extra arguments
//! - Give handlers access to the renderer and shared state
//!
//! # Design Decisions
//! - Body is buffered before dispatch (bounded by the body limit layer)
//! - Extra arguments (from `/api/load-component` props) never shadow path
//!   parameters

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::app::state::SharedState;
use crate::app::App;
use crate::error::AppError;
use crate::render::{Props, Rendered};
use crate::routing::PathParams;

/// Header carrying the request ID set by the middleware stack.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Everything a route handler can see about its request.
#[derive(Clone)]
pub struct RouteRequest {
    pub app: Arc<App>,
    pub method: Method,
    pub path: String,
    pub params: PathParams,
    pub extra: Map<String, Value>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RouteRequest {
    /// A captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A path parameter or, failing that, an extra argument.
    pub fn arg(&self, name: &str) -> Option<Value> {
        self.param(name)
            .map(|v| Value::String(v.to_string()))
            .or_else(|| self.extra.get(name).cloned())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::status(400, format!("invalid JSON body: {e}")))
    }

    pub fn state(&self) -> &SharedState {
        self.app.state()
    }

    /// Render a registered component.
    pub fn render(&self, component: &str, props: Props) -> Result<Rendered, AppError> {
        self.app.components().render(component, props)
    }
}
