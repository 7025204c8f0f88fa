//! Startup-time registration of components, routes, events and hooks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use serde_json::Value;
use thiserror::Error;

use crate::app::hooks::{AfterHook, BeforeHook, ErrorHandler, ErrorHandlers, ErrorKey, Hooks};
use crate::app::state::SharedState;
use crate::app::App;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::{handler as event_handler, EventCall, EventDispatcher, EventHandler, EventResult};
use crate::http::request::RouteRequest;
use crate::http::response::Reply;
use crate::http::shell::{ShellTemplate, TemplateError};
use crate::live_reload::{ConnectedChannels, StaticEpoch};
use crate::render::{ComponentDefinition, ComponentRenderer, RenderScope};
use crate::routing::{Route, RouteHandler, Router};

/// Errors detected while freezing the registries.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("component `{0}` registered twice")]
    DuplicateComponent(String),

    #[error("event handler `{0}` registered twice")]
    DuplicateEvent(String),

    #[error("shell template rejected: {0}")]
    Template(#[from] TemplateError),
}

/// Collects registrations; `build` freezes them into an [`App`].
pub struct AppBuilder {
    config: AppConfig,
    components: Vec<ComponentDefinition>,
    routes: Vec<Route>,
    events: Vec<(String, EventHandler)>,
    errors: HashMap<ErrorKey, ErrorHandler>,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    shell: Option<ShellTemplate>,
    state: SharedState,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            routes: Vec::new(),
            events: Vec::new(),
            errors: HashMap::new(),
            before: Vec::new(),
            after: Vec::new(),
            shell: None,
            state: SharedState::new(),
        }
    }

    /// Register a component under a unique name.
    pub fn component<F>(mut self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut RenderScope<'_>) -> Result<String, AppError> + Send + Sync + 'static,
    {
        self.components.push(ComponentDefinition::new(name, render));
        self
    }

    /// Register a route. Earlier registrations win on ties.
    pub fn route<F, Fut, R>(mut self, pattern: &str, methods: &[Method], f: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, AppError>> + Send + 'static,
        R: Into<Reply> + Send + 'static,
    {
        let handler: RouteHandler = Arc::new(move |request| {
            let fut = f(request);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        self.routes.push(Route::new(pattern, methods, handler));
        self
    }

    /// Shorthand for a `GET`-only route.
    pub fn get<F, Fut, R>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, AppError>> + Send + 'static,
        R: Into<Reply> + Send + 'static,
    {
        self.route(pattern, &[Method::GET], handler)
    }

    /// Register a client-event handler by its global name.
    pub fn event<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(EventCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EventResult, AppError>> + Send + 'static,
    {
        self.events.push((name.into(), event_handler(handler)));
        self
    }

    /// Register an error handler. A later registration for the same key
    /// replaces the earlier one.
    pub fn error_handler<F>(mut self, key: ErrorKey, handler: F) -> Self
    where
        F: Fn(&AppError) -> Reply + Send + Sync + 'static,
    {
        self.errors.insert(key, Arc::new(handler));
        self
    }

    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request<Body>) -> Option<Response> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    pub fn after_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response) -> Option<Response> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Use `shell` instead of the configured or embedded template.
    pub fn shell(mut self, shell: ShellTemplate) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Seed a shared-state entry.
    pub fn state(self, key: impl Into<String>, value: Value) -> Self {
        self.state.set(key, value);
        self
    }

    /// Validate registrations and freeze them.
    pub fn build(self) -> Result<App, BuildError> {
        let mut components = HashMap::with_capacity(self.components.len());
        for definition in self.components {
            let name = definition.name().to_string();
            if components.insert(name.clone(), definition).is_some() {
                return Err(BuildError::DuplicateComponent(name));
            }
        }

        let mut events = HashMap::with_capacity(self.events.len());
        for (name, handler) in self.events {
            if events.insert(name.clone(), handler).is_some() {
                return Err(BuildError::DuplicateEvent(name));
            }
        }

        let shell = match (self.shell, &self.config.assets.shell_template) {
            (Some(shell), _) => shell,
            (None, Some(path)) => ShellTemplate::load(path)?,
            (None, None) => ShellTemplate::embedded(),
        };

        tracing::info!(
            components = components.len(),
            routes = self.routes.len(),
            events = events.len(),
            error_handlers = self.errors.len(),
            "Application registries frozen"
        );

        Ok(App {
            components: ComponentRenderer::new(components),
            routes: Router::new(self.routes),
            events: EventDispatcher::new(events, self.config.timeouts.handler()),
            errors: ErrorHandlers::new(self.errors),
            hooks: Hooks::new(self.before, self.after),
            shell,
            state: self.state,
            channels: ConnectedChannels::new(),
            epoch: StaticEpoch::new(),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_component_rejected() {
        let result = AppBuilder::new(AppConfig::default())
            .component("Card", |_| Ok("<div></div>".into()))
            .component("Card", |_| Ok("<span></span>".into()))
            .build();
        assert!(matches!(result, Err(BuildError::DuplicateComponent(name)) if name == "Card"));
    }

    #[test]
    fn test_duplicate_event_rejected() {
        let result = AppBuilder::new(AppConfig::default())
            .event("save", |_| async { Ok(EventResult::from(())) })
            .event("save", |_| async { Ok(EventResult::from(true)) })
            .build();
        assert!(matches!(result, Err(BuildError::DuplicateEvent(name)) if name == "save"));
    }

    #[test]
    fn test_missing_shell_file_rejected() {
        let mut config = AppConfig::default();
        config.assets.shell_template = Some("/definitely/not/here.html".into());
        let result = AppBuilder::new(config).build();
        assert!(matches!(result, Err(BuildError::Template(TemplateError::Io { .. }))));
    }

    #[test]
    fn test_build_freezes_registries() {
        let app = AppBuilder::new(AppConfig::default())
            .component("Greeting", |scope| Ok(format!("<p>{}</p>", scope.prop_str("name", "you"))))
            .get("/", |req: RouteRequest| async move { req.render("Greeting", Default::default()) })
            .event("ping", |_| async { Ok(EventResult::Value(json!("pong"))) })
            .state("count", json!(0))
            .build()
            .unwrap();

        assert!(app.components().contains("Greeting"));
        assert_eq!(app.routes().len(), 1);
        assert!(app.events().contains("ping"));
        assert_eq!(app.state().get("count"), Some(json!(0)));
        assert!(app.channels().is_empty());
    }
}
