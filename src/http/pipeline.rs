//! Request pipeline: hooks, route resolution, error recovery and shell
//! composition.
//!
//! # Data Flow
//! ```text
//! hooks_middleware
//!     → before-hooks (first response short-circuits)
//!     → serve_page
//!         → resolve (route table, handler under the handler timeout)
//!         → recover (error registry: exact status, then fallback)
//!         → finish (Fragment → shell document, Response → pass-through)
//!     → after-hooks
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::app::App;
use crate::error::AppError;
use crate::http::request::RouteRequest;
use crate::http::response::{Fragment, Reply};
use crate::http::shell::stylesheet_block;
use crate::observability::metrics;

/// Before-hooks, the inner service, then after-hooks.
pub async fn hooks_middleware(
    State(app): State<Arc<App>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = match app.hooks().run_before(&request) {
        Some(response) => {
            tracing::debug!(
                path = %request.uri().path(),
                status = %response.status(),
                "Before-hook short-circuited request"
            );
            response
        }
        None => next.run(request).await,
    };

    let response = app.hooks().run_after(response);
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// Catch-all page handler.
pub async fn serve_page(State(app): State<Arc<App>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, app.config().limits.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let outcome = resolve(
        &app,
        parts.method,
        parts.uri.path(),
        Map::new(),
        parts.headers,
        body,
    )
    .await;

    match recover(&app, outcome) {
        Ok((status, reply)) => finish(&app, status, reply).await,
        Err(error) => error.into_response(),
    }
}

/// Find the first matching route and run its handler under the handler
/// timeout.
pub async fn resolve(
    app: &Arc<App>,
    method: Method,
    path: &str,
    extra: Map<String, Value>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Reply, AppError> {
    let Some(matched) = app.routes().resolve(path, &method) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        return Err(AppError::NotFoundRoute {
            method,
            path: path.to_string(),
        });
    };

    tracing::debug!(
        method = %method,
        path = %path,
        pattern = %matched.route.pattern(),
        "Route matched"
    );

    let handler = matched.route.handler().clone();
    let request = RouteRequest {
        app: Arc::clone(app),
        method,
        path: path.to_string(),
        params: matched.params,
        extra,
        headers,
        body,
    };

    let bound = app.config().timeouts.handler();
    match tokio::time::timeout(bound, handler(request)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(path = %path, timeout = ?bound, "Route handler timed out");
            Err(AppError::Timeout(bound))
        }
    }
}

/// Turn a failed resolution into a reply using the error registry.
///
/// Success passes through as `200`. An error without a registered handler
/// is returned unchanged for the caller to render opaquely.
pub fn recover(
    app: &App,
    outcome: Result<Reply, AppError>,
) -> Result<(StatusCode, Reply), AppError> {
    let error = match outcome {
        Ok(reply) => return Ok((StatusCode::OK, reply)),
        Err(error) => error,
    };

    let status = error.status_code();
    match app.errors().resolve(&error) {
        Some(handler) => {
            tracing::debug!(error = %error, status = %status, "Error handler invoked");
            Ok((status, handler(&error)))
        }
        None => Err(error),
    }
}

/// Compose a fragment into the document shell, or pass a response through.
pub async fn finish(app: &App, status: StatusCode, reply: Reply) -> Response {
    match reply {
        Reply::Response(response) => response,
        Reply::Fragment(fragment) => match compose_document(app, fragment).await {
            Ok(document) => (status, Html(document)).into_response(),
            Err(error) => error.into_response(),
        },
    }
}

async fn compose_document(app: &App, fragment: Fragment) -> Result<String, AppError> {
    let assets = &app.config().assets;
    let sheets: Vec<String> = assets
        .global_stylesheets
        .iter()
        .cloned()
        .chain(fragment.stylesheets)
        .collect();

    let styles = stylesheet_block(&assets.static_dir, &sheets, app.epoch().current()).await?;
    Ok(app
        .shell()
        .compose(&styles, &fragment.markup, &app.state().to_json()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppBuilder, ErrorKey};
    use crate::config::AppConfig;
    use std::io::Write;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_passes_params() {
        let app = Arc::new(
            AppBuilder::new(AppConfig::default())
                .get("/hello/<name>", |req: RouteRequest| async move {
                    Ok(format!("<p>{}</p>", req.param("name").unwrap_or_default()))
                })
                .build()
                .unwrap(),
        );

        let reply = resolve(&app, Method::GET, "/hello/ada", Map::new(), HeaderMap::new(), Bytes::new())
            .await
            .unwrap();
        let Reply::Fragment(fragment) = reply else {
            panic!("expected fragment");
        };
        assert_eq!(fragment.markup, "<p>ada</p>");
    }

    #[tokio::test]
    async fn test_unmatched_route_without_handler_is_default_404() {
        let app = Arc::new(AppBuilder::new(AppConfig::default()).build().unwrap());
        let outcome = resolve(&app, Method::GET, "/missing", Map::new(), HeaderMap::new(), Bytes::new()).await;

        let error = recover(&app, outcome).unwrap_err();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "<p>404 - Not Found</p>");
    }

    #[tokio::test]
    async fn test_registered_404_handler_keeps_status() {
        let app = Arc::new(
            AppBuilder::new(AppConfig::default())
                .error_handler(ErrorKey::Status(404), |_| Reply::from("<h1>Lost</h1>"))
                .build()
                .unwrap(),
        );
        let outcome = resolve(&app, Method::GET, "/nope", Map::new(), HeaderMap::new(), Bytes::new()).await;
        let (status, reply) = recover(&app, outcome).unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = finish(&app, status, reply).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("<div id=\"root\"><h1>Lost</h1></div>"));
    }

    #[tokio::test]
    async fn test_fallback_handler_catches_render_errors() {
        let app = Arc::new(
            AppBuilder::new(AppConfig::default())
                .get("/boom", |_| async { Err::<String, _>(AppError::render("Page", "boom")) })
                .error_handler(ErrorKey::Fallback, |e| Reply::from(format!("<p>{e}</p>")))
                .build()
                .unwrap(),
        );
        let outcome = resolve(&app, Method::GET, "/boom", Map::new(), HeaderMap::new(), Bytes::new()).await;
        let (status, reply) = recover(&app, outcome).unwrap();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let Reply::Fragment(fragment) = reply else {
            panic!("expected fragment");
        };
        assert_eq!(fragment.markup, "<p>render failed in Page: boom</p>");
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let mut config = AppConfig::default();
        config.timeouts.handler_secs = 1;
        let app = Arc::new(
            AppBuilder::new(config)
                .get("/slow", |_| async {
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    Ok("<p>late</p>")
                })
                .build()
                .unwrap(),
        );

        let outcome = resolve(&app, Method::GET, "/slow", Map::new(), HeaderMap::new(), Bytes::new()).await;
        assert!(matches!(outcome, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_document_inlines_stylesheets_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut css = std::fs::File::create(dir.path().join("site.css")).unwrap();
        write!(css, "body{{margin:0}}").unwrap();

        let mut config = AppConfig::default();
        config.assets.static_dir = dir.path().to_path_buf();
        config.assets.global_stylesheets = vec!["site.css".to_string()];
        let app = AppBuilder::new(config)
            .state("count", serde_json::json!(3))
            .build()
            .unwrap();

        let response = finish(&app, StatusCode::OK, Reply::from("<main>hi</main>")).await;
        let body = body_text(response).await;
        assert!(body.contains("<style data-stylesheet=\"site.css\" data-epoch=\""));
        assert!(body.contains("body{margin:0}</style>"));
        assert!(body.contains("window.INITIAL_STATE = {\"count\":3};"));
        assert!(body.contains("<main>hi</main>"));
    }

    #[tokio::test]
    async fn test_response_reply_passes_through() {
        let app = AppBuilder::new(AppConfig::default()).build().unwrap();
        let reply = Reply::from(StatusCode::NO_CONTENT.into_response());
        let response = finish(&app, StatusCode::OK, reply).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
