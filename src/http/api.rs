//! JSON API used by the client runtime.
//!
//! # Endpoints
//! - `POST /api/event`: dispatch a named client event
//! - `POST /api/load-component`: render a component (or a route, when the
//!   name starts with `/`) and return the bare fragment

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::app::App;
use crate::error::AppError;
use crate::events::{EventReply, EventRequest};
use crate::http::pipeline::{recover, resolve};
use crate::http::response::Reply;
use crate::render::Props;

/// Body of `POST /api/load-component`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadComponentRequest {
    #[serde(default, alias = "component_name")]
    pub component_name: Option<String>,
    #[serde(default)]
    pub props: Props,
}

pub async fn handle_event(
    State(app): State<Arc<App>>,
    Json(request): Json<EventRequest>,
) -> Result<EventReply, AppError> {
    app.events().dispatch(request, app.state()).await
}

pub async fn load_component(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(request): Json<LoadComponentRequest>,
) -> Response {
    let Some(name) = request.component_name.filter(|name| !name.is_empty()) else {
        return AppError::MissingField("component_name").into_response();
    };

    if name.starts_with('/') {
        tracing::debug!(path = %name, "Loading route fragment");
        let outcome = resolve(&app, Method::GET, &name, request.props, headers, Bytes::new()).await;
        return bare_fragment(recover(&app, outcome));
    }

    match app.components().render(&name, request.props) {
        Ok(rendered) => Html(rendered.markup).into_response(),
        Err(AppError::UnknownComponent(name)) => {
            tracing::warn!(component = %name, "Unknown component requested");
            Html(format!("<p>Component '{name}' not found</p>")).into_response()
        }
        Err(error) => bare_fragment(recover(&app, Err(error))),
    }
}

/// Fragments are returned without the document shell.
fn bare_fragment(recovered: Result<(StatusCode, Reply), AppError>) -> Response {
    match recovered {
        Ok((status, Reply::Fragment(fragment))) => (status, Html(fragment.markup)).into_response(),
        Ok((_, Reply::Response(response))) => response,
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_request_accepts_both_spellings() {
        let camel: LoadComponentRequest =
            serde_json::from_str(r#"{"componentName":"Card","props":{"n":1}}"#).unwrap();
        assert_eq!(camel.component_name.as_deref(), Some("Card"));
        assert_eq!(camel.props["n"], 1);

        let snake: LoadComponentRequest =
            serde_json::from_str(r#"{"component_name":"/about"}"#).unwrap();
        assert_eq!(snake.component_name.as_deref(), Some("/about"));
        assert!(snake.props.is_empty());
    }

    #[test]
    fn test_load_request_name_optional() {
        let empty: LoadComponentRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.component_name.is_none());
    }
}
