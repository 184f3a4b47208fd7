//! Record Compressor
//!
//! Shrinks a raw feed download into a snapshot small enough for the backing
//! store: every row is cut down to the essential fields, and only the latest
//! row per vehicle survives.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::info;

use crate::feed::{compare_timestamps, CompressedRecord, RawRecord, Snapshot};

/// Projects and deduplicates a feed download into a snapshot.
///
/// Rows without an identifier are dropped. For each identifier the row with
/// the greatest `datahora` is kept; on ties the first row seen wins. Output
/// keeps the order in which identifiers first appeared.
pub fn compress<I>(records: I) -> Snapshot
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut raw_count = 0usize;
    let snapshot = dedup(
        records
            .into_iter()
            .inspect(|_| raw_count += 1)
            .map(CompressedRecord::from),
    );

    info!("Deduplicated: {} -> {} buses", raw_count, snapshot.len());
    snapshot
}

pub(crate) fn dedup<I>(records: I) -> Snapshot
where
    I: Iterator<Item = CompressedRecord>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<CompressedRecord> = Vec::new();

    for record in records {
        let Some(id) = record.identity() else {
            continue;
        };

        match slots.get(&id) {
            Some(&slot) => {
                let current = &mut kept[slot];
                if compare_timestamps(record.datahora.as_ref(), current.datahora.as_ref())
                    == Ordering::Greater
                {
                    *current = record;
                }
            }
            None => {
                slots.insert(id, kept.len());
                kept.push(record);
            }
        }
    }

    Snapshot::new(kept)
}
