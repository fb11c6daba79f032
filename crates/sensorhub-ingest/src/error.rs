//! Error types for the ingestion pipeline.
//!
//! Decode degradation is deliberately absent: the decoder is total and
//! captures unparseable payloads as raw fallbacks instead of failing.

/// Errors surfaced by a broker transport.
///
/// Both variants end the current connection epoch; the controller logs
/// them and reconnects with backoff. Neither is ever fatal.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The broker could not be reached or the handshake failed.
    #[error("broker connect failed: {0}")]
    Connect(String),

    /// The broker refused the subscription request.
    ///
    /// Treated exactly like a dropped connection: log, back off, retry.
    #[error("subscribe rejected: {0}")]
    Subscribe(String),
}

/// Errors surfaced by a [`ReadingStore`](crate::store::ReadingStore).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The storage backend failed or is unreachable.
    ///
    /// On `append` the affected message is dropped (there is no redelivery
    /// channel from the broker) and logged as a data-loss incident; the
    /// subscription keeps consuming. On `recent` the caller may retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
