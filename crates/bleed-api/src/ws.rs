//! `WebSocket` stream of echo lifecycle notifications.
//!
//! Clients connect to `GET /ws/echoes` and receive one JSON-encoded
//! [`EchoNotification`](bleed_types::EchoNotification) per creation,
//! approval, rejection, or completion. A client that falls behind skips
//! the notifications it missed and resumes from the newest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// `GET /ws/echoes`
pub async fn ws_echoes(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_notifications(socket, state))
}

async fn stream_notifications(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.subscribe();
    debug!("Echo stream client connected");

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(notification) => {
                    let json = match serde_json::to_string(&notification) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!(echo_id = %notification.echo.id, "Failed to encode notification: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        debug!("Echo stream client gone (send failed)");
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Echo stream client lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("Notification channel closed");
                    return;
                }
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    debug!("Echo stream client disconnected");
                    return;
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                // Clients have nothing to say on this stream.
                Some(Ok(_)) => {}
            },
        }
    }
}
