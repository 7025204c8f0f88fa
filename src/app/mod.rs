//! The process-wide application context.
//!
//! # Data Flow
//! ```text
//! AppBuilder (startup, single thread)
//!     → components, routes, events, error handlers, hooks, shell
//!     → build(): validate, freeze
//!     → Arc<App> shared by every request, event and push channel
//! ```
//!
//! # Design Decisions
//! - Registries are immutable after build; only `SharedState`,
//!   `ConnectedChannels` and `StaticEpoch` change at runtime
//! - No globals: handlers reach the context through `RouteRequest::app`
//!   or the `EventCall` state handle

pub mod builder;
pub mod hooks;
pub mod state;

pub use builder::{AppBuilder, BuildError};
pub use hooks::{AfterHook, BeforeHook, ErrorHandler, ErrorHandlers, ErrorKey, Hooks};
pub use state::SharedState;

use std::fmt;

use crate::config::AppConfig;
use crate::events::EventDispatcher;
use crate::http::shell::ShellTemplate;
use crate::live_reload::{ConnectedChannels, StaticEpoch};
use crate::render::ComponentRenderer;
use crate::routing::Router;

/// Frozen registries plus the small amount of shared runtime state.
pub struct App {
    config: AppConfig,
    components: ComponentRenderer,
    routes: Router,
    events: EventDispatcher,
    errors: ErrorHandlers,
    hooks: Hooks,
    shell: ShellTemplate,
    state: SharedState,
    channels: ConnectedChannels,
    epoch: StaticEpoch,
}

impl App {
    pub fn builder(config: AppConfig) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn components(&self) -> &ComponentRenderer {
        &self.components
    }

    pub fn routes(&self) -> &Router {
        &self.routes
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn errors(&self) -> &ErrorHandlers {
        &self.errors
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn shell(&self) -> &ShellTemplate {
        &self.shell
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn channels(&self) -> &ConnectedChannels {
        &self.channels
    }

    pub fn epoch(&self) -> &StaticEpoch {
        &self.epoch
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("mode", &self.config.mode)
            .field("routes", &self.routes.len())
            .field("events", &self.events.len())
            .field("errors", &self.errors)
            .field("hooks", &self.hooks)
            .field("channels", &self.channels.len())
            .finish_non_exhaustive()
    }
}
