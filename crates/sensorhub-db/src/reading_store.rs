//! Append/recent operations on the `readings` table.
//!
//! Each reading is inserted individually: the ingestion controller
//! requires the write to be acknowledged durable before it broadcasts, so
//! there is never a batch to amortize. Recent-history scans walk the
//! `(received_at, id)` index backwards and are bounded by the clamped
//! limit.

use async_trait::async_trait;
use sensorhub_ingest::{ReadingStore, StoreError, clamp_limit};
use sensorhub_types::{Reading, ReadingId, StoredReading};
use sqlx::PgPool;
use uuid::Uuid;

use crate::postgres::PostgresPool;

/// [`ReadingStore`] backed by the `readings` table.
#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    /// Create a store over an existing pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn append(&self, reading: Reading) -> Result<StoredReading, StoreError> {
        // The identity is assigned app-side (UUID v7) so the stored
        // reading handed to the broadcast hub needs no round-trip.
        let id = ReadingId::new();
        sqlx::query(
            r"INSERT INTO readings (id, temperature, humidity, observed_at, topic, received_at, raw_fallback)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id.into_inner())
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.observed_at)
        .bind(&reading.topic)
        .bind(reading.received_at)
        .bind(&reading.raw_fallback)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(StoredReading::new(id, reading))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredReading>, StoreError> {
        let limit = i64::try_from(clamp_limit(limit)).unwrap_or(i64::MAX);
        let mut rows = sqlx::query_as::<_, ReadingRow>(
            r"SELECT id, temperature, humidity, observed_at, topic, received_at, raw_fallback
              FROM readings
              ORDER BY received_at DESC, id DESC
              LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // The scan walks newest-first for the LIMIT; callers get oldest
        // first.
        rows.reverse();
        Ok(rows.into_iter().map(ReadingRow::into_stored).collect())
    }
}

impl std::fmt::Debug for PgReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgReadingStore").finish_non_exhaustive()
    }
}

/// A row from the `readings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReadingRow {
    /// Storage identity.
    pub id: Uuid,
    /// Temperature sample, if present.
    pub temperature: Option<f64>,
    /// Humidity sample, if present.
    pub humidity: Option<f64>,
    /// Producer-claimed observation time.
    pub observed_at: chrono::DateTime<chrono::Utc>,
    /// Source topic.
    pub topic: String,
    /// Receipt time assigned by the ingestion controller.
    pub received_at: chrono::DateTime<chrono::Utc>,
    /// Original payload text for readings that failed decoding.
    pub raw_fallback: Option<String>,
}

impl ReadingRow {
    /// Convert a database row into the shared [`StoredReading`] type.
    pub fn into_stored(self) -> StoredReading {
        StoredReading {
            id: ReadingId::from(self.id),
            temperature: self.temperature,
            humidity: self.humidity,
            observed_at: self.observed_at,
            topic: self.topic,
            received_at: self.received_at,
            raw_fallback: self.raw_fallback,
        }
    }
}
