//! Telemetry reading records.
//!
//! A [`Reading`] is one observed sample as produced by the ingestion
//! pipeline's decoder; a [`StoredReading`] is the same sample after the
//! store has assigned it an identity. Both serialize with camelCase field
//! names, which is the wire contract the producers and the dashboard
//! already speak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ReadingId;

/// One observed telemetry sample, prior to persistence.
///
/// Producers are untrusted: either numeric field may be missing, and a
/// payload that failed structured decoding is retained with its original
/// text in `raw_fallback` instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Reading {
    /// Temperature sample, if the payload carried one.
    pub temperature: Option<f64>,
    /// Humidity sample, if the payload carried one.
    pub humidity: Option<f64>,
    /// Producer-claimed observation time. Defaults to the ingestion time
    /// when the payload omits it or it cannot be parsed.
    pub observed_at: DateTime<Utc>,
    /// The source topic the message arrived on.
    pub topic: String,
    /// Time of receipt, assigned exactly once by the ingestion controller.
    pub received_at: DateTime<Utc>,
    /// Original payload text, present only when structured decoding failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_fallback: Option<String>,
}

/// A [`Reading`] that has been durably written, plus its storage identity.
///
/// Only stored readings are ever broadcast to observers: the hub never
/// emits an event for data the store does not have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StoredReading {
    /// Storage-assigned identity.
    pub id: ReadingId,
    /// Temperature sample, if present.
    pub temperature: Option<f64>,
    /// Humidity sample, if present.
    pub humidity: Option<f64>,
    /// Producer-claimed observation time.
    pub observed_at: DateTime<Utc>,
    /// The source topic the message arrived on.
    pub topic: String,
    /// Time of receipt, carried over unchanged from the [`Reading`].
    pub received_at: DateTime<Utc>,
    /// Original payload text for readings that failed structured decoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_fallback: Option<String>,
}

impl StoredReading {
    /// Attach a storage identity to a reading.
    pub fn new(id: ReadingId, reading: Reading) -> Self {
        Self {
            id,
            temperature: reading.temperature,
            humidity: reading.humidity,
            observed_at: reading.observed_at,
            topic: reading.topic,
            received_at: reading.received_at,
            raw_fallback: reading.raw_fallback,
        }
    }
}
