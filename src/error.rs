//! Error taxonomy shared by the request pipeline, the renderer and the
//! event dispatcher.

use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::http::shell::TemplateError;

/// Errors raised while resolving a request, rendering a component or
/// dispatching an event.
#[derive(Debug, Error)]
pub enum AppError {
    /// No registered route matches the request.
    #[error("no route matches {method} {path}")]
    NotFoundRoute { method: Method, path: String },

    /// The event name is not in the handler registry.
    #[error("event handler not found: {0}")]
    UnknownEvent(String),

    /// A component name is not in the component registry.
    #[error("component not found: {0}")]
    UnknownComponent(String),

    /// A required request field was absent.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A render function or route handler failed.
    #[error("render failed in {component}: {message}")]
    Render { component: String, message: String },

    /// A failure carrying an explicit HTTP status (see [`AppError::status`]).
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// A handler did not finish within the configured bound.
    #[error("handler exceeded {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

impl AppError {
    /// Abort the current request with an explicit status code.
    ///
    /// Codes outside the valid HTTP range collapse to 500.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        }
    }

    /// Report a failure inside a render function.
    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            component: component.into(),
            message: message.into(),
        }
    }

    /// HTTP status attached to this error (500 when none is).
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFoundRoute { .. } => StatusCode::NOT_FOUND,
            AppError::UnknownEvent(_) => StatusCode::NOT_FOUND,
            AppError::UnknownComponent(_) => StatusCode::NOT_FOUND,
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::Status { status, .. } => *status,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Render { .. } | AppError::Io(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Last line of defense: locally recoverable errors get their structured
/// bodies, everything else becomes an opaque status response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::UnknownEvent(_) => (
                status,
                Json(serde_json::json!({ "error": "Event handler not found" })),
            )
                .into_response(),
            AppError::MissingField(field) => (
                status,
                Json(serde_json::json!({ "error": format!("{field} is required") })),
            )
                .into_response(),
            AppError::NotFoundRoute { .. } => {
                (status, Html("<p>404 - Not Found</p>")).into_response()
            }
            AppError::UnknownComponent(name) => {
                (status, Html(format!("<p>Component '{name}' not found</p>"))).into_response()
            }
            other => {
                tracing::error!(error = %other, status = %status, "Unhandled error");
                (status, status.canonical_reason().unwrap_or("Error")).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::status(418, "teapot").status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(AppError::status(42, "bogus").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::render("App", "boom").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::MissingField("component_name").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Timeout(Duration::from_secs(1)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_missing_field_message() {
        let err = AppError::MissingField("component_name");
        assert_eq!(err.to_string(), "component_name is required");
    }
}
