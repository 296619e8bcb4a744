//! WebSocket status feed.
//!
//! Flow:
//! 1. Client connects to `/v1/share/status/:session_id`
//! 2. Every poll interval the gateway sends `{status, peers, progress}`
//! 3. When the session expires the gateway sends `{"status":"expired"}` and
//!    closes the socket; a store failure sends
//!    `{"status":"unavailable","error":...}` and closes likewise
//! 4. A client close (or any socket error) unsubscribes the poller

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use pb_sessions::{StatusSubscription, WatchEvent};

use crate::state::AppState;

/// GET /v1/share/status/:session_id, upgrade to WebSocket.
pub async fn status_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let subscription = state.sessions.subscribe(&session_id);
        handle_socket(socket, subscription, &session_id).await;
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Socket handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn handle_socket(socket: WebSocket, mut subscription: StatusSubscription, session_id: &str) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    tracing::debug!(session_id = %session_id, "status socket opened");

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else { break };
                let terminal = event.is_terminal();
                let frame = event_frame(&event);
                if ws_sink.send(Message::Text(frame)).await.is_err() {
                    break;
                }
                if terminal {
                    let _ = ws_sink.close().await;
                    break;
                }
            }
            incoming = ws_stream.next() => {
                match incoming {
                    // Clients have nothing to say; anything but a close is ignored.
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    subscription.unsubscribe().await;
    tracing::debug!(session_id = %session_id, "status socket closed");
}

/// JSON text frame for one watch event.
fn event_frame(event: &WatchEvent) -> String {
    let value = match event {
        WatchEvent::Snapshot(snapshot) => serde_json::to_value(snapshot).unwrap_or_default(),
        WatchEvent::Expired => serde_json::json!({ "status": "expired" }),
        WatchEvent::Unavailable(reason) => serde_json::json!({
            "status": "unavailable",
            "error": reason,
        }),
    };
    value.to_string()
}
