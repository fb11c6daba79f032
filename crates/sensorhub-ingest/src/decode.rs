//! Lenient payload decoding for untrusted producers.
//!
//! Producers publish whatever they like: well-formed JSON, JSON with
//! numeric values quoted as strings, or arbitrary bytes. The pipeline must
//! never drop a message purely because it is malformed, so [`decode`] is a
//! total function -- a payload that fails structured parsing is retained
//! with its original text in `raw_fallback` instead of being rejected.

use chrono::{DateTime, Utc};
use sensorhub_types::Reading;
use serde_json::Value;
use tracing::warn;

/// Decode a raw broker payload into a [`Reading`].
///
/// `now` is the receipt time assigned by the ingestion controller; it
/// becomes `received_at` and doubles as the `observed_at` fallback when
/// the payload carries no usable timestamp.
///
/// Decoding degrades instead of failing:
///
/// 1. On a structured parse, `temperature` and `humidity` are extracted as
///    numbers, coercing numeric-looking strings; anything else becomes
///    `None`.
/// 2. `ts` (or `observedAt`) is accepted as an RFC 3339 string or epoch
///    milliseconds; otherwise `observed_at` is `now`.
/// 3. If the payload is not JSON at all, the reading keeps the raw text
///    in `raw_fallback` with both numeric fields empty.
pub fn decode(raw: &[u8], topic: &str, now: DateTime<Utc>) -> Reading {
    match serde_json::from_slice::<Value>(raw) {
        Ok(payload) => Reading {
            temperature: numeric_field(&payload, "temperature"),
            humidity: numeric_field(&payload, "humidity"),
            observed_at: timestamp_field(&payload).unwrap_or(now),
            topic: topic.to_owned(),
            received_at: now,
            raw_fallback: None,
        },
        Err(e) => {
            warn!(topic, error = %e, "unparseable payload, retaining raw text");
            Reading {
                temperature: None,
                humidity: None,
                observed_at: now,
                topic: topic.to_owned(),
                received_at: now,
                raw_fallback: Some(String::from_utf8_lossy(raw).into_owned()),
            }
        }
    }
}

/// Extract a numeric field, coercing strings like `"22.5"`.
fn numeric_field(payload: &Value, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract the producer-claimed observation time, if any.
///
/// Producers write `ts`; `observedAt` is accepted as an alias. Strings are
/// parsed as RFC 3339, numbers as epoch milliseconds.
fn timestamp_field(payload: &Value) -> Option<DateTime<Utc>> {
    match payload.get("ts").or_else(|| payload.get("observedAt"))? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => {
            #[allow(clippy::cast_possible_truncation)]
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}
