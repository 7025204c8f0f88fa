//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → pipeline.rs (before-hooks, route resolution, after-hooks)
//!         → request.rs (RouteRequest handed to route handlers)
//!         → response.rs (Reply: fragment or pass-through response)
//!         → shell.rs (document composition for fragments)
//!     → api.rs (event dispatch, component loading)
//!     → websocket.rs (live-reload push channel)
//! ```

pub mod api;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;
pub mod shell;
pub mod websocket;

pub use request::{RouteRequest, X_REQUEST_ID};
pub use response::{Fragment, Reply};
pub use server::HttpServer;
pub use shell::ShellTemplate;
