//! Shared application state and the query facade.
//!
//! [`AppState`] holds the two collaborators every observer needs: the
//! broadcast hub (live readings) and the reading store (recent history).
//! It is wrapped in [`Arc`] and injected via Axum's `State` extractor.

use std::sync::Arc;

use sensorhub_ingest::{BroadcastHub, ObserverFeed, ReadingStore, StoreError};
use sensorhub_types::StoredReading;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    hub: BroadcastHub,
    store: Arc<dyn ReadingStore>,
}

impl AppState {
    /// Create the application state from the pipeline's collaborators.
    pub fn new(hub: BroadcastHub, store: Arc<dyn ReadingStore>) -> Self {
        Self { hub, store }
    }

    /// Register a new observer with the broadcast hub.
    ///
    /// Effective immediately for subsequently published readings.
    pub fn subscribe(&self) -> ObserverFeed {
        self.hub.register()
    }

    /// Serve a recent-history snapshot, oldest first.
    ///
    /// This is the query facade: it delegates to the store, which clamps
    /// the limit to its accepted range. Ordering contract: any reading
    /// published after a snapshot taken *before* registering with the hub
    /// has a `received_at` no earlier than the snapshot's last element.
    /// The snapshot/register race itself is an accepted consistency gap --
    /// a reading published between the two calls may be missed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend cannot be
    /// queried; callers should treat it as retryable.
    pub async fn snapshot(&self, limit: usize) -> Result<Vec<StoredReading>, StoreError> {
        self.store.recent(limit).await
    }

    /// Number of currently connected observers.
    pub fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}
