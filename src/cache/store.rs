//! Cache Store Module
//!
//! Backing key/value store holding the compressed snapshot and its fetch time
//! under two keys.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, SNAPSHOT_KEY, TIMESTAMP_KEY};
use crate::error::{Result, TrackerError};

// == Cache Store Trait ==
/// Two-key backing store for the snapshot.
///
/// The pair is written together but read without any atomicity guarantee:
/// a reader may see a snapshot with the previous generation's timestamp, or a
/// snapshot with no timestamp at all. Every write is a full overwrite, so
/// concurrent writers are harmless and the last one wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the stored pair. Returns None when no snapshot has been written.
    async fn get(&self) -> Result<Option<CacheEntry>>;

    /// Overwrites both keys.
    async fn put(&self, snapshot: String, fetched_at: u64) -> Result<()>;
}

// == Memory Store ==
/// In-process key/value store with a per-value size ceiling.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    values: RwLock<HashMap<String, String>>,
    /// Largest value accepted, in bytes
    max_value_bytes: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_value_bytes` - Largest value the store accepts
    pub fn new(max_value_bytes: usize) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            max_value_bytes,
        }
    }

    // == Raw Access ==
    /// Writes a single key directly, bypassing the pair semantics.
    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, key: &str, value: &str) {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self) -> Result<Option<CacheEntry>> {
        let values = self.values.read().await;

        let Some(snapshot) = values.get(SNAPSHOT_KEY) else {
            return Ok(None);
        };
        let fetched_at = values.get(TIMESTAMP_KEY).and_then(|v| v.parse().ok());

        Ok(Some(CacheEntry::new(snapshot.clone(), fetched_at)))
    }

    async fn put(&self, snapshot: String, fetched_at: u64) -> Result<()> {
        // Validate value size
        if snapshot.len() > self.max_value_bytes {
            return Err(TrackerError::StoreUnavailable(format!(
                "Value of {} bytes exceeds maximum size of {} bytes",
                snapshot.len(),
                self.max_value_bytes
            )));
        }

        let mut values = self.values.write().await;
        values.insert(SNAPSHOT_KEY.to_string(), snapshot);
        values.insert(TIMESTAMP_KEY.to_string(), fetched_at.to_string());

        Ok(())
    }
}
