// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live snapshot streaming for waiting-room displays.
//!
//! This module provides read-only, non-authoritative state change
//! notifications via WebSocket connections. Each message is the full
//! snapshot after a mutation, so a display that joins late or misses
//! messages is current again after the next one it receives.
//!
//! No commands are executed over WebSocket connections; mutations go
//! through the HTTP endpoints.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use fila_api::QueueSnapshot;
use futures::{SinkExt, stream::StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Handles WebSocket upgrade requests for live snapshot streaming.
pub async fn live_snapshots_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<crate::AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handles an individual WebSocket connection.
///
/// Sends the current snapshot immediately, then streams every published
/// snapshot until the client disconnects or an error occurs.
async fn handle_socket(socket: WebSocket, app_state: crate::AppState) {
    info!("Client connected to live snapshot stream");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before capturing so nothing published in between is lost.
    let mut rx: broadcast::Receiver<QueueSnapshot> = app_state.broadcaster.subscribe();

    let initial: QueueSnapshot = {
        let queue = app_state.queue.lock().await;
        QueueSnapshot::capture(&queue)
    };
    match serde_json::to_string(&initial) {
        Ok(json) => {
            if sender.send(Message::Text(json.into())).await.is_err() {
                warn!("Failed to send initial snapshot");
                return;
            }
        }
        Err(e) => {
            error!(?e, "Failed to serialize initial snapshot");
            return;
        }
    }

    // Task for sending snapshots to the client
    let mut send_task = tokio::spawn(async move {
        while let Ok(snapshot) = rx.recv().await {
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        // Client disconnected
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize snapshot");
                }
            }
        }
    });

    // Task for receiving messages from the client (though we don't expect any)
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    // We don't process commands over WebSocket
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Ping/pong handled automatically by Axum
                }
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live snapshot stream");
}
