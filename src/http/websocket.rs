//! Live-reload push channel (`GET /ws`).
//!
//! # Responsibilities
//! - Complete the WebSocket upgrade
//! - Register the connection in `ConnectedChannels`
//! - Forward `reload` pushes; ignore inbound frames
//! - Deregister on disconnect or failed send
//!
//! # Data Flow
//! ```text
//! ReloadBroadcaster ──try_send──▶ mpsc ──▶ this task ──▶ Client
//! ```

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::app::App;

pub async fn push_channel(ws: WebSocketUpgrade, State(app): State<Arc<App>>) -> Response {
    ws.on_upgrade(move |socket| serve_channel(socket, app))
}

async fn serve_channel(mut socket: WebSocket, app: Arc<App>) {
    let capacity = app.config().live_reload.channel_capacity;
    let (id, mut pushes) = app.channels().connect(capacity);

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            push = pushes.recv() => {
                let Some(push) = push else {
                    break;
                };
                if socket.send(Message::Text(push.as_str().into())).await.is_err() {
                    tracing::debug!(channel = %id, "Push failed, closing channel");
                    break;
                }
            }
        }
    }

    app.channels().disconnect(&id);
}
