//! Snapshot Module
//!
//! The deduplicated set of current vehicle positions held in the cache.

use serde::{Deserialize, Serialize};

use crate::feed::compress::dedup;
use crate::feed::CompressedRecord;

// == Snapshot ==
/// The most recent known position of every vehicle, one record per identifier.
///
/// Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<CompressedRecord>,
}

impl Snapshot {
    pub(crate) fn new(records: Vec<CompressedRecord>) -> Self {
        Self { records }
    }

    /// Records in first-seen order.
    pub fn records(&self) -> &[CompressedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Runs deduplication again over this snapshot's own records.
    ///
    /// A snapshot produced by `compress` is a fixed point of this operation.
    pub fn recompress(&self) -> Snapshot {
        dedup(self.records.iter().cloned())
    }

    /// Serializes the snapshot for the backing store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a snapshot read back from the backing store.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
