//! Axum router construction for the observer API.
//!
//! Assembles the REST and WebSocket routes into a single [`Router`] with
//! CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/readings` -- WebSocket reading stream
/// - `GET /api/readings` -- recent readings, oldest first
/// - `GET /api/health` -- liveness check
///
/// CORS is configured to allow any origin for development. In production
/// this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/readings", get(ws::ws_readings))
        // REST API
        .route("/api/readings", get(handlers::list_readings))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
