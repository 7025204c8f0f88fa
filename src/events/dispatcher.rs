//! Client event dispatch.
//!
//! # Responsibilities
//! - Resolve an event name against the global handler registry
//! - Invoke the handler with the component id, arguments and shared state
//! - Encode the handler's tagged result for the wire
//!
//! # Design Decisions
//! - Registry is keyed by event name only; the component id is data
//! - Unknown events never touch shared state
//! - Handler execution is bounded by the configured handler timeout

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    response::{Html, IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::app::state::SharedState;
use crate::error::AppError;
use crate::observability::metrics;

/// What a handler wants sent back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Raw markup, sent as-is with an HTML content type.
    Markup(String),
    /// A mapping serialized exactly as given.
    Structured(Map<String, Value>),
    /// Any other value, wrapped with a full shared-state snapshot.
    Value(Value),
}

impl From<i64> for EventResult {
    fn from(v: i64) -> Self {
        EventResult::Value(Value::from(v))
    }
}

impl From<bool> for EventResult {
    fn from(v: bool) -> Self {
        EventResult::Value(Value::from(v))
    }
}

impl From<()> for EventResult {
    fn from(_: ()) -> Self {
        EventResult::Value(Value::Null)
    }
}

/// Arguments passed to an event handler.
#[derive(Debug, Clone)]
pub struct EventCall {
    pub component_id: String,
    pub args: Vec<Value>,
    pub state: SharedState,
}

impl EventCall {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

pub type EventFuture = BoxFuture<'static, Result<EventResult, AppError>>;

/// A type-erased event handler.
pub type EventHandler = Arc<dyn Fn(EventCall) -> EventFuture + Send + Sync>;

/// Box an async closure into an [`EventHandler`].
pub fn handler<F, Fut>(f: F) -> EventHandler
where
    F: Fn(EventCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<EventResult, AppError>> + Send + 'static,
{
    Arc::new(move |call| Box::pin(f(call)))
}

/// Body of `POST /api/event`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(default, alias = "event_name")]
    pub event_name: String,
    #[serde(default, alias = "component_id")]
    pub component_id: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Encoded dispatch result.
#[derive(Debug, Clone, PartialEq)]
pub enum EventReply {
    Markup(String),
    Json(Value),
}

impl IntoResponse for EventReply {
    fn into_response(self) -> Response {
        match self {
            EventReply::Markup(markup) => Html(markup).into_response(),
            EventReply::Json(value) => Json(value).into_response(),
        }
    }
}

/// Immutable event registry plus the dispatch bound.
pub struct EventDispatcher {
    handlers: HashMap<String, EventHandler>,
    timeout: Duration,
}

impl EventDispatcher {
    pub fn new(handlers: HashMap<String, EventHandler>, timeout: Duration) -> Self {
        Self { handlers, timeout }
    }

    pub fn contains(&self, event_name: &str) -> bool {
        self.handlers.contains_key(event_name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered for `request.event_name`.
    pub async fn dispatch(
        &self,
        request: EventRequest,
        state: &SharedState,
    ) -> Result<EventReply, AppError> {
        let Some(handler) = self.handlers.get(&request.event_name) else {
            tracing::warn!(event = %request.event_name, "Unknown event");
            metrics::record_event(&request.event_name, "unknown");
            return Err(AppError::UnknownEvent(request.event_name));
        };

        tracing::debug!(
            event = %request.event_name,
            component_id = %request.component_id,
            args = request.args.len(),
            "Dispatching event"
        );

        let call = EventCall {
            component_id: request.component_id,
            args: request.args,
            state: state.clone(),
        };

        let result = match tokio::time::timeout(self.timeout, handler(call)).await {
            Ok(result) => result,
            Err(_) => {
                metrics::record_event(&request.event_name, "timeout");
                return Err(AppError::Timeout(self.timeout));
            }
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                metrics::record_event(&request.event_name, "error");
                return Err(e);
            }
        };

        metrics::record_event(&request.event_name, "ok");
        Ok(encode(result, state))
    }
}

/// Markup and mappings pass through; everything else gets the state envelope.
pub fn encode(result: EventResult, state: &SharedState) -> EventReply {
    match result {
        EventResult::Markup(markup) => EventReply::Markup(markup),
        EventResult::Structured(map) => EventReply::Json(Value::Object(map)),
        EventResult::Value(value) => EventReply::Json(json!({
            "result": value,
            "newState": state.snapshot(),
        })),
    }
}
