//! PostgreSQL data layer for the sensorhub telemetry pipeline.
//!
//! PostgreSQL is the durable record of every ingested reading. This crate
//! provides the connection pool, migrations, and the concrete
//! [`ReadingStore`](sensorhub_ingest::ReadingStore) implementation the
//! ingestion controller writes through.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time
//! checked) to avoid requiring a live database at build time. All queries
//! are parameterized.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool and configuration
//! - [`reading_store`] -- append/recent operations on the `readings` table
//! - [`error`] -- shared error types

pub mod error;
pub mod postgres;
pub mod reading_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use reading_store::{PgReadingStore, ReadingRow};
