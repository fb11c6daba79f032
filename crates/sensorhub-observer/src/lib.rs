//! Observer API server for the sensorhub telemetry pipeline.
//!
//! Exposes the ingestion pipeline's output to any number of observers:
//! a WebSocket stream that opens with a bounded recent-history snapshot
//! and then pushes every stored reading live, plus a thin REST query
//! surface over the same store.
//!
//! Observers are ephemeral -- they exist only as registrations in the
//! broadcast hub from connect to disconnect, and a slow observer can
//! never slow down ingestion or other observers.
//!
//! # Modules
//!
//! - [`state`] -- shared application state and the query facade
//! - [`ws`] -- WebSocket reading stream
//! - [`handlers`] -- REST endpoint handlers
//! - [`router`] -- route assembly with CORS and tracing
//! - [`server`] -- bind/serve lifecycle with graceful shutdown
//! - [`error`] -- HTTP-facing error type

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
