use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use cardio_events::BroadcastHub;
use cardio_store::TimeSeriesStore;
use futures::{SinkExt, StreamExt};

use crate::ingest::ingest_text;
use crate::state::AppState;

/// Interval between heartbeat pings on each connection.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, state.store))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Subscribes to the hub.
///   2. Spawns a sender task forwarding hub messages (and heartbeat pings).
///   3. Ingests inbound text frames on the current task.
///   4. Unsubscribes on disconnect.
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>, store: Arc<TimeSeriesStore>) {
    let mut subscription = hub.subscribe().await;
    let conn_id = subscription.id;
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        loop {
            let frame = tokio::select! {
                message = subscription.recv() => match message {
                    Some(message) => Message::Text(message.to_labeled().into()),
                    None => Message::Close(None),
                },
                _ = heartbeat.tick() => Message::Ping(Bytes::new()),
            };
            let closing = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() {
                tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let stored = ingest_text(&store, text.as_str());
                tracing::trace!(conn_id = %conn_id, stored, "WebSocket ingest");
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    hub.unsubscribe(conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
