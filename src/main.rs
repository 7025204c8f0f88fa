//! fragment-server
//!
//! Serves server-rendered components with a small demo application.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────┐
//!                 │                  FRAGMENT SERVER                    │
//!                 │                                                     │
//!   Request       │  ┌────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ──────────────┼─▶│ server │──▶│ pipeline │──▶│ routing → handler│  │
//!                 │  └────────┘   │  hooks   │   └────────┬─────────┘  │
//!                 │               └────┬─────┘            ▼            │
//!   Document      │               ┌────┴─────┐   ┌──────────────────┐  │
//!   ◀─────────────┼───────────────│  shell   │◀──│ render (stamped  │  │
//!                 │               └──────────┘   │   fragments)     │  │
//!                 │                              └──────────────────┘  │
//!   /api/event ───┼──▶ events → SharedState                           │
//!   /ws ◀─────────┼─── live_reload (watcher → broadcaster)            │
//!                 └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Map};
use tokio::net::TcpListener;

use fragment_server::app::ErrorKey;
use fragment_server::config::Mode;
use fragment_server::events::EventResult;
use fragment_server::http::{Reply, RouteRequest};
use fragment_server::lifecycle::{signals, startup};
use fragment_server::render::fragment::escape_attr;
use fragment_server::{App, AppConfig, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "fragment-server")]
#[command(about = "Server-rendered component framework demo", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured mode (development or production).
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Overrides the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = startup::load_or_default(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    startup::init_observability(&config);
    tracing::info!("fragment-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let app = Arc::new(demo_app(config)?);

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    HttpServer::new(app).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_app(config: AppConfig) -> Result<App, fragment_server::app::BuildError> {
    App::builder(config)
        .state("count", json!(0))
        .component("Greeting", |scope| {
            let name = escape_attr(&scope.prop_str("name", "world"));
            Ok(format!("<h1>Hello, {name}!</h1>"))
        })
        .component("Counter", |scope| {
            let count = scope.prop("count").cloned().unwrap_or(json!(0));
            Ok(format!(
                "<span class=\"count\">{count}</span><button data-event=\"increment\">+</button>"
            ))
        })
        .component("Home", |scope| {
            let greeting = scope.render_child("Greeting", Map::new())?;
            let mut props = Map::new();
            props.insert("count".into(), scope.prop("count").cloned().unwrap_or(json!(0)));
            let counter = scope.render_child("Counter", props)?;
            Ok(format!("<main>{greeting}{counter}</main>"))
        })
        .get("/", |req: RouteRequest| async move {
            let mut props = Map::new();
            props.insert("count".into(), req.state().get("count").unwrap_or(json!(0)));
            req.render("Home", props)
        })
        .get("/hello/<name>", |req: RouteRequest| async move {
            let mut props = Map::new();
            if let Some(name) = req.arg("name") {
                props.insert("name".into(), name);
            }
            req.render("Greeting", props)
        })
        .event("increment", |call| async move {
            let next = call
                .state
                .update("count", |current| json!(current.and_then(|v| v.as_i64()).unwrap_or(0) + 1));
            Ok(EventResult::Value(next))
        })
        .error_handler(ErrorKey::Status(404), |_| {
            Reply::from("<section><h1>Page not found</h1></section>")
        })
        .build()
}
