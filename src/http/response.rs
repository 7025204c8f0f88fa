//! Handler results and response helpers.
//!
//! # Responsibilities
//! - Distinguish fragments (composed into the shell) from finished responses
//! - Build redirects, JSON payloads, HTML documents and file downloads
//!
//! # Design Decisions
//! - The split is explicit in the type: a handler returns `Reply::Fragment`
//!   or `Reply::Response`, nothing is inferred at runtime
//! - Helpers that build headers from caller input return `Result`

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::render::Rendered;

/// Markup to be spliced into the shell, with the stylesheets it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub markup: String,
    pub stylesheets: Vec<String>,
}

/// What a route or error handler produced.
#[derive(Debug)]
pub enum Reply {
    /// Composed into the document shell.
    Fragment(Fragment),
    /// Passed through untouched.
    Response(Response),
}

impl Reply {
    pub fn is_fragment(&self) -> bool {
        matches!(self, Reply::Fragment(_))
    }
}

impl From<String> for Reply {
    fn from(markup: String) -> Self {
        Reply::Fragment(Fragment {
            markup,
            stylesheets: Vec::new(),
        })
    }
}

impl From<&str> for Reply {
    fn from(markup: &str) -> Self {
        Reply::from(markup.to_string())
    }
}

impl From<Rendered> for Reply {
    fn from(rendered: Rendered) -> Self {
        Reply::Fragment(Fragment {
            markup: rendered.markup,
            stylesheets: rendered.stylesheets,
        })
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

/// Redirect to `location` with the given 3xx status.
pub fn redirect(location: &str, status: StatusCode) -> Result<Reply, AppError> {
    if !status.is_redirection() {
        return Err(AppError::status(500, format!("{status} is not a redirect status")));
    }
    Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .map(Reply::Response)
        .map_err(|e| AppError::status(500, format!("invalid redirect: {e}")))
}

/// Serialize `value` as a JSON response.
pub fn json<T: Serialize>(value: T) -> Reply {
    Reply::Response(Json(value).into_response())
}

/// A complete HTML document that bypasses shell composition.
pub fn html(document: impl Into<String>) -> Reply {
    Reply::Response(Html(document.into()).into_response())
}

/// Send raw bytes as a download.
pub fn send_file(
    data: impl Into<Vec<u8>>,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<Reply, AppError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type.unwrap_or("application/octet-stream"),
        );
    if let Some(name) = file_name {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name.replace('"', "")),
        );
    }
    builder
        .body(Body::from(data.into()))
        .map(Reply::Response)
        .map_err(|e| AppError::status(500, format!("invalid file response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect() {
        let Reply::Response(res) = redirect("/login", StatusCode::FOUND).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/login");
    }

    #[test]
    fn test_redirect_rejects_non_3xx() {
        assert!(redirect("/", StatusCode::OK).is_err());
    }

    #[test]
    fn test_send_file_headers() {
        let Reply::Response(res) =
            send_file(b"PNG".to_vec(), Some("logo.png"), Some("image/png")).unwrap()
        else {
            panic!("expected response");
        };
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"logo.png\""
        );
    }

    #[test]
    fn test_string_is_fragment() {
        assert!(Reply::from("<p>x</p>").is_fragment());
        assert!(!json(serde_json::json!({ "a": 1 })).is_fragment());
    }
}
