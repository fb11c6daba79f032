//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Readings use UUID v7 (time-ordered) so that the storage index over
//! `(received_at, id)` stays append-friendly and the id itself can break
//! ordering ties between readings received in the same instant.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier assigned to a reading when it is appended to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReadingId(pub Uuid);

impl ReadingId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ReadingId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ReadingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReadingId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ReadingId> for Uuid {
    fn from(id: ReadingId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ReadingId::new();
        let b = ReadingId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let earlier = ReadingId::new();
        let later = ReadingId::new();
        assert!(earlier <= later);
    }

    #[test]
    fn display_matches_inner_uuid() {
        let id = ReadingId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
