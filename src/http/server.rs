//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the API, page and push-channel handlers
//! - Mount static assets
//! - Wire up middleware (hooks, tracing, limits, request ID, timeout)
//! - Start the live-reload loop in development mode
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, on, post, MethodFilter},
    Router,
};
use notify::RecommendedWatcher;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::App;
use crate::http::request::X_REQUEST_ID;
use crate::http::{api, pipeline, websocket};
use crate::lifecycle::Shutdown;
use crate::live_reload::{ReloadBroadcaster, SourceWatcher};

/// Header stamped on every response.
pub const FRAMEWORK_HEADER: &str = "x-framework-name";
pub const FRAMEWORK_NAME: &str = "fragment-server";

const PAGE_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE)
    .or(MethodFilter::PATCH);

/// HTTP server for a built [`App`].
pub struct HttpServer {
    app: Arc<App>,
    router: Router,
}

impl HttpServer {
    pub fn new(app: Arc<App>) -> Self {
        let router = Self::build_router(Arc::clone(&app));
        Self { app, router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(app: Arc<App>) -> Router {
        let config = app.config();
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut router = Router::new()
            .route("/api/event", post(api::handle_event))
            .route("/api/load-component", post(api::load_component))
            .route("/", on(PAGE_METHODS, pipeline::serve_page))
            .route("/{*path}", on(PAGE_METHODS, pipeline::serve_page));

        if config.mode.is_development() {
            router = router.route("/ws", get(websocket::push_channel));
        }

        router
            .nest_service(
                config.assets.mount_path.trim_end_matches('/'),
                ServeDir::new(&config.assets.static_dir),
            )
            .layer(middleware::from_fn_with_state(
                Arc::clone(&app),
                pipeline::hooks_middleware,
            ))
            .with_state(Arc::clone(&app))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static(FRAMEWORK_HEADER),
                HeaderValue::from_static(FRAMEWORK_NAME),
            ))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = ?self.app.config().mode,
            "HTTP server starting"
        );

        // Dropping the watcher stops file events, so it lives until serve returns.
        let _watcher = if self.app.config().mode.is_development() {
            self.spawn_live_reload(shutdown.subscribe())
        } else {
            None
        };

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_live_reload(&self, shutdown: broadcast::Receiver<()>) -> Option<RecommendedWatcher> {
        let config = self.app.config();
        let mut roots = config.live_reload.watch_paths.clone();
        roots.push(config.assets.static_dir.clone());

        let (watcher, changes) = SourceWatcher::new(
            roots,
            config.live_reload.extensions.clone(),
            config.live_reload.queue_capacity,
        );

        let handle = match watcher.run() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start file watcher, live reload disabled");
                return None;
            }
        };

        let broadcaster = ReloadBroadcaster::new(
            self.app.channels().clone(),
            self.app.epoch().clone(),
        );
        tokio::spawn(broadcaster.run(changes, shutdown));
        Some(handle)
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }
}
