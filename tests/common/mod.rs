//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fragment_server::config::Mode;
use fragment_server::{App, AppBuilder, AppConfig, HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running server bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: Arc<App>,
    pub shutdown: Shutdown,
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config rooted in `dir`: `dir/src` is watched, `dir/static` is served.
pub fn test_config(dir: &Path, mode: Mode) -> AppConfig {
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::create_dir_all(dir.join("static")).unwrap();

    let mut config = AppConfig::default();
    config.mode = mode;
    config.listener.bind_address = "127.0.0.1:0".into();
    config.assets.static_dir = dir.join("static");
    config.live_reload.watch_paths = vec![dir.join("src")];
    config.timeouts.handler_secs = 2;
    config
}

/// Build the app produced by `configure` and serve it in the background.
pub async fn spawn_app<F>(mode: Mode, configure: F) -> TestServer
where
    F: FnOnce(AppBuilder) -> AppBuilder,
{
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), mode);
    let app = Arc::new(configure(App::builder(config)).build().unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(Arc::clone(&app));
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        app,
        shutdown,
        dir,
    }
}

/// Client without proxies or redirect following.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Poll `condition` every 20ms for up to `limit`.
#[allow(dead_code)]
pub async fn wait_until<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
