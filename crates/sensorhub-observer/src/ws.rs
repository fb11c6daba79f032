//! WebSocket handler for the live reading stream.
//!
//! Clients connect to `GET /ws/readings` and receive a `snapshot` frame
//! with the bounded recent history, followed by one `reading` frame per
//! stored reading as the pipeline publishes it.
//!
//! The snapshot is taken *before* registering with the hub, so a reading
//! published in between may be missed -- an accepted consistency gap. A
//! client that falls far behind loses backlog readings (its hub mailbox
//! replaces old entries with the newest) but is never disconnected and
//! never slows anyone else down.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use sensorhub_ingest::DEFAULT_RECENT_LIMIT;
use sensorhub_types::StoredReading;
use tracing::{debug, warn};

use crate::state::AppState;

/// Query parameters for the `GET /ws/readings` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct StreamQuery {
    /// Size of the initial snapshot (default 50, clamped by the store).
    pub limit: Option<usize>,
}

/// Frames pushed to WebSocket clients.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsFrame {
    /// The initial bounded recent-history snapshot, oldest first.
    Snapshot {
        /// Recent readings, oldest first.
        readings: Vec<StoredReading>,
    },
    /// One live reading.
    Reading {
        /// The stored reading that was just published.
        reading: StoredReading,
    },
}

/// Upgrade an HTTP request to a WebSocket connection and begin streaming
/// readings.
///
/// # Route
///
/// `GET /ws/readings?limit=N`
pub async fn ws_readings(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    ws.on_upgrade(move |socket| handle_ws(socket, state, limit))
}

/// Handle the WebSocket lifecycle: snapshot, register, stream.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, limit: usize) {
    debug!("WebSocket observer connected");

    // Snapshot first, then register (see module docs for the race).
    let readings = match state.snapshot(limit).await {
        Ok(readings) => readings,
        Err(e) => {
            // Retryable store outage: close so the client reconnects
            // instead of silently starting with a hole in its history.
            warn!(error = %e, "snapshot unavailable, closing WebSocket");
            return;
        }
    };
    if send_frame(&mut socket, &WsFrame::Snapshot { readings })
        .await
        .is_err()
    {
        debug!("WebSocket observer disconnected during snapshot");
        return;
    }

    let mut feed = state.subscribe();

    loop {
        tokio::select! {
            // A reading published by the ingestion controller.
            received = feed.recv() => {
                match received {
                    Some(reading) => {
                        if send_frame(&mut socket, &WsFrame::Reading { reading })
                            .await
                            .is_err()
                        {
                            debug!("WebSocket observer disconnected (send failed)");
                            return;
                        }
                    }
                    None => {
                        debug!("observer feed closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket observer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket observer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Ignore text/binary frames from the client.
                    }
                }
            }
        }
    }
}

/// Serialize and send one frame. An `Err` means the client is gone.
async fn send_frame(socket: &mut WebSocket, frame: &WsFrame) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize WebSocket frame: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}
