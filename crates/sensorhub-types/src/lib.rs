//! Shared type definitions for the sensorhub telemetry pipeline.
//!
//! This crate is the single source of truth for the data model shared by
//! the ingestion core, the storage layer, and the observer API. Types
//! defined here flow downstream to `TypeScript` via `ts-rs` for the
//! dashboard frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for reading identifiers
//! - [`reading`] -- The [`Reading`] / [`StoredReading`] telemetry records

pub mod ids;
pub mod reading;

// Re-export all public types at crate root for convenience.
pub use ids::ReadingId;
pub use reading::{Reading, StoredReading};
