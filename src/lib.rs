//! Server-rendered UI components over HTTP.
//!
//! Components render to markup fragments stamped with a per-render
//! identity, routes map URL patterns to handlers, a JSON endpoint
//! dispatches named client events against process-wide shared state, and
//! in development a file watcher pushes `reload` to connected browsers.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod lifecycle;
pub mod live_reload;
pub mod observability;
pub mod render;
pub mod routing;

pub use app::{App, AppBuilder};
pub use config::schema::AppConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
