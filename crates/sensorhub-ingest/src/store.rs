//! Storage port consumed by the ingestion pipeline.
//!
//! The pipeline only needs an append/query contract; the concrete
//! PostgreSQL implementation lives in `sensorhub-db`. Keeping the seam
//! here lets tests drive the controller with an in-memory store.

use async_trait::async_trait;
use sensorhub_types::{Reading, StoredReading};

use crate::error::StoreError;

/// Smallest accepted `recent` limit.
pub const MIN_RECENT_LIMIT: usize = 1;

/// Largest accepted `recent` limit. Bounds the snapshot scan.
pub const MAX_RECENT_LIMIT: usize = 1000;

/// Limit applied when a caller does not specify one.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Clamp a requested `recent` limit into the accepted range.
///
/// Out-of-range limits are clamped rather than rejected, matching the
/// query surface's contract.
pub const fn clamp_limit(limit: usize) -> usize {
    if limit < MIN_RECENT_LIMIT {
        MIN_RECENT_LIMIT
    } else if limit > MAX_RECENT_LIMIT {
        MAX_RECENT_LIMIT
    } else {
        limit
    }
}

/// Append-only persistence of readings plus a bounded recent-history query.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a reading and assign its storage identity.
    ///
    /// The call does not return until the write is acknowledged durable by
    /// the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on backend failure.
    async fn append(&self, reading: Reading) -> Result<StoredReading, StoreError>;

    /// Return the most recent readings, oldest first.
    ///
    /// Ordered by `received_at` ascending (ties broken by id). The limit
    /// is clamped via [`clamp_limit`], never rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on backend failure; callers may
    /// retry.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredReading>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_limits_pass_through() {
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(1000), 1000);
    }

    #[test]
    fn out_of_range_limits_are_clamped() {
        assert_eq!(clamp_limit(0), MIN_RECENT_LIMIT);
        assert_eq!(clamp_limit(5000), MAX_RECENT_LIMIT);
        assert_eq!(clamp_limit(usize::MAX), MAX_RECENT_LIMIT);
    }
}
