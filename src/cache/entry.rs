//! Cache Entry Module
//!
//! The snapshot/timestamp pair as read back from the backing store.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::feed::Snapshot;

// == Cache Entry ==
/// A serialized snapshot together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Serialized snapshot (JSON array)
    pub snapshot: String,
    /// Fetch timestamp (Unix milliseconds), None when the timestamp key is
    /// missing or unreadable
    pub fetched_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(snapshot: String, fetched_at: Option<u64>) -> Self {
        Self {
            snapshot,
            fetched_at,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the fetch, or None if the fetch time is unknown.
    ///
    /// Clamps to zero when the stored timestamp is ahead of `now`.
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.fetched_at.map(|at| now_ms.saturating_sub(at))
    }

    // == Is Fresh ==
    /// Checks whether the entry is still inside the freshness window.
    ///
    /// Boundary condition: an entry whose age equals the TTL is stale. An entry
    /// with an unknown fetch time is always stale.
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms).is_some_and(|age| age < ttl_ms)
    }

    // == Decode ==
    /// Parses the stored snapshot.
    pub fn decode(&self) -> serde_json::Result<Snapshot> {
        Snapshot::from_json(&self.snapshot)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
