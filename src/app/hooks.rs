//! Request hooks and the error-handler registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::error::AppError;
use crate::http::response::Reply;

/// Runs before routing; returning a response short-circuits the request.
pub type BeforeHook = Arc<dyn Fn(&Request<Body>) -> Option<Response> + Send + Sync>;

/// Runs on every response; may edit it in place or return a replacement.
pub type AfterHook = Arc<dyn Fn(&mut Response) -> Option<Response> + Send + Sync>;

/// Produces a reply for a failed route resolution.
pub type ErrorHandler = Arc<dyn Fn(&AppError) -> Reply + Send + Sync>;

/// Key of the error-handler registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    /// Handles errors carrying exactly this status code.
    Status(u16),
    /// Handles anything without a status-specific handler.
    Fallback,
}

/// Ordered before/after hooks.
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
}

impl Hooks {
    pub fn new(before: Vec<BeforeHook>, after: Vec<AfterHook>) -> Self {
        Self { before, after }
    }

    /// First response returned by a before-hook, if any.
    pub fn run_before(&self, request: &Request<Body>) -> Option<Response> {
        self.before.iter().find_map(|hook| hook(request))
    }

    /// Thread `response` through every after-hook in order.
    pub fn run_after(&self, mut response: Response) -> Response {
        for hook in &self.after {
            if let Some(replacement) = hook(&mut response) {
                response = replacement;
            }
        }
        response
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// Status-keyed error handlers with an optional generic fallback.
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    handlers: HashMap<ErrorKey, ErrorHandler>,
}

impl ErrorHandlers {
    pub fn new(handlers: HashMap<ErrorKey, ErrorHandler>) -> Self {
        Self { handlers }
    }

    pub fn get(&self, key: ErrorKey) -> Option<&ErrorHandler> {
        self.handlers.get(&key)
    }

    /// Exact status first, then the fallback.
    pub fn resolve(&self, error: &AppError) -> Option<&ErrorHandler> {
        self.get(ErrorKey::Status(error.status_code().as_u16()))
            .or_else(|| self.get(ErrorKey::Fallback))
    }
}

impl fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;

    fn before(f: impl Fn(&Request<Body>) -> Option<Response> + Send + Sync + 'static) -> BeforeHook {
        Arc::new(f)
    }

    fn after(f: impl Fn(&mut Response) -> Option<Response> + Send + Sync + 'static) -> AfterHook {
        Arc::new(f)
    }

    #[test]
    fn test_before_hooks_short_circuit_in_order() {
        let hooks = Hooks::new(
            vec![
                before(|_| None),
                before(|_| Some(StatusCode::FORBIDDEN.into_response())),
                before(|_| Some(StatusCode::IM_A_TEAPOT.into_response())),
            ],
            vec![],
        );
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = hooks.run_before(&request).unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_after_hooks_edit_or_replace() {
        let hooks = Hooks::new(
            vec![],
            vec![
                after(|res| {
                    res.headers_mut().insert("x-one", HeaderValue::from_static("1"));
                    None
                }),
                after(|res| {
                    assert_eq!(res.headers()["x-one"], "1");
                    Some(StatusCode::ACCEPTED.into_response())
                }),
            ],
        );
        let response = hooks.run_after(StatusCode::OK.into_response());
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().get("x-one").is_none());
    }

    #[test]
    fn test_error_resolution_order() {
        fn handler(f: impl Fn(&AppError) -> Reply + Send + Sync + 'static) -> ErrorHandler {
            Arc::new(f)
        }
        let exact = handler(|_| Reply::from("exact"));
        let fallback = handler(|_| Reply::from("fallback"));
        let handlers = ErrorHandlers::new(HashMap::from([
            (ErrorKey::Status(418), exact),
            (ErrorKey::Fallback, fallback),
        ]));

        let teapot = AppError::status(418, "short and stout");
        let Reply::Fragment(f) = handlers.resolve(&teapot).unwrap()(&teapot) else {
            panic!("expected fragment");
        };
        assert_eq!(f.markup, "exact");

        let boom = AppError::render("App", "boom");
        let Reply::Fragment(f) = handlers.resolve(&boom).unwrap()(&boom) else {
            panic!("expected fragment");
        };
        assert_eq!(f.markup, "fallback");

        assert!(ErrorHandlers::default().resolve(&boom).is_none());
    }
}
