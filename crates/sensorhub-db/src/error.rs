//! Error types for the data layer.
//!
//! Pool and migration failures surface as [`DbError`]. Per-operation
//! failures on the reading store are mapped to the ingestion core's
//! `StoreError::Unavailable` at the trait boundary, since callers there
//! only care about one thing: the backend did not acknowledge the write.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
