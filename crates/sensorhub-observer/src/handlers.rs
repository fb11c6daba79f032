//! REST endpoint handlers for the observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/readings` | Recent readings, oldest first |
//! | `GET` | `/api/health` | Liveness check |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use sensorhub_ingest::DEFAULT_RECENT_LIMIT;
use sensorhub_types::StoredReading;

use crate::error::ObserverError;
use crate::state::AppState;

/// Query parameters for the `GET /api/readings` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ReadingsQuery {
    /// Maximum number of readings to return (default 50, clamped to
    /// 1..=1000 by the store).
    pub limit: Option<usize>,
}

/// Serve the most recent readings, oldest first.
///
/// # Route
///
/// `GET /api/readings?limit=N`
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<Vec<StoredReading>>, ObserverError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let readings = state.snapshot(limit).await?;
    Ok(Json(readings))
}

/// Liveness check.
///
/// # Route
///
/// `GET /api/health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Serve a minimal HTML page showing server status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let observers = state.observer_count();
    Html(format!(
        r"<!DOCTYPE html>
<html lang=en>
<head><meta charset=utf-8><title>sensorhub</title></head>
<body>
    <h1>sensorhub</h1>
    <p>Telemetry ingestion pipeline. Connected observers: {observers}</p>
    <ul>
        <li>GET /api/readings?limit=N</li>
        <li>GET /api/health</li>
        <li>GET /ws/readings?limit=N (WebSocket)</li>
    </ul>
</body>
</html>"
    ))
}
