//! Live Update WebSocket
//!
//! Streams every [`LiveMessage`] to the client as a JSON text frame until
//! either side goes away.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use live_updates::LiveMessage;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, error, warn};

use crate::AppState;

pub async fn socket(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let updates = state.live.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, updates))
}

async fn stream_updates(mut socket: WebSocket, mut updates: Receiver<LiveMessage>) {
    loop {
        let message = tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Live socket closed by client");
                    break;
                }
                Some(Err(e)) => {
                    debug!("Live socket error: {}", e);
                    break;
                }
                Some(Ok(_)) => continue,
            },
            update = updates.recv() => match update {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Live socket lagged, {} updates skipped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode live update: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(text)).await.is_err() {
            debug!("Live socket send failed, client gone");
            break;
        }
    }
}
