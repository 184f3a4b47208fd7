//! Query Projector
//!
//! Applies a request's line filter and optional slim projection to a snapshot.

use serde::Serialize;

use crate::feed::{CompressedRecord, SlimRecord, Snapshot};
use crate::query::QueryFilter;

// == Projection ==
/// Filtered records in the shape the caller asked for.
///
/// Serializes as a bare JSON array either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projection {
    Full(Vec<CompressedRecord>),
    Slim(Vec<SlimRecord>),
}

impl Projection {
    pub fn len(&self) -> usize {
        match self {
            Projection::Full(records) => records.len(),
            Projection::Slim(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps the records whose line matches the filter, then applies slim.
///
/// Record order follows the snapshot; callers must not rely on it.
pub fn project(snapshot: &Snapshot, filter: &QueryFilter) -> Projection {
    let matching = snapshot
        .records()
        .iter()
        .filter(|record| filter.matches(record.linha.as_ref()));

    if filter.slim {
        Projection::Slim(matching.map(SlimRecord::from).collect())
    } else {
        Projection::Full(matching.cloned().collect())
    }
}
