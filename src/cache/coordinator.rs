//! Freshness Coordinator
//!
//! Decides per request whether the cached snapshot is served as is, served
//! while a background refresh runs, or replaced by a blocking refresh.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, Clock, SystemClock};
use crate::error::{Result, TrackerError};
use crate::feed::{compress, Snapshot, Upstream};
use crate::tasks::spawn_background_refresh;

// == Cache Status ==
/// How a request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Cached snapshot inside the freshness window
    Hit,
    /// Cached snapshot past the window, refresh running in the background
    Stale,
    /// No usable snapshot, the request waited on the feed
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Resolution ==
/// The snapshot chosen for a request plus what the caller needs for headers.
#[derive(Debug)]
pub struct Resolution {
    pub snapshot: Snapshot,
    pub status: CacheStatus,
    /// Age of the served snapshot, None when its fetch time is unknown
    pub age_ms: Option<u64>,
    /// Background refresh spawned by this request, if any. Dropping the handle
    /// detaches the task; it keeps running.
    pub background: Option<JoinHandle<()>>,
}

impl Resolution {
    /// Age rounded to whole seconds; unknown ages report 0.
    pub fn age_secs(&self) -> u64 {
        self.age_ms.map(|ms| (ms + 500) / 1000).unwrap_or(0)
    }
}

// == Refresh Guard ==
/// Marks a background refresh as in flight until dropped.
#[derive(Debug)]
pub(crate) struct RefreshGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// == Freshness Coordinator ==
/// Read-through front for the snapshot.
///
/// Holds no snapshot of its own: every call re-reads the backing store and
/// derives HIT / STALE / MISS from the stored fetch time.
#[derive(Clone)]
pub struct FreshnessCoordinator {
    store: Arc<dyn CacheStore>,
    upstream: Arc<dyn Upstream>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    /// Allow at most one background refresh in flight
    coalesce: bool,
    refreshing: Arc<AtomicBool>,
    stats: Arc<RwLock<CacheStats>>,
}

impl FreshnessCoordinator {
    // == Constructor ==
    /// Creates a coordinator over the given store and feed.
    ///
    /// # Arguments
    /// * `store` - Backing store holding the snapshot pair
    /// * `upstream` - Feed client used for refreshes
    /// * `ttl` - Freshness window
    pub fn new(store: Arc<dyn CacheStore>, upstream: Arc<dyn Upstream>, ttl: Duration) -> Self {
        Self {
            store,
            upstream,
            clock: Arc::new(SystemClock),
            ttl,
            coalesce: true,
            refreshing: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RwLock::new(CacheStats::new())),
        }
    }

    /// Replaces the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enables or disables single-flight background refreshes.
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a copy of the current counters.
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    // == Resolve ==
    /// Picks the snapshot to serve for one request.
    ///
    /// - HIT: stored snapshot younger than the TTL, no network.
    /// - STALE: stored snapshot at or past the TTL (or with no fetch time); it is
    ///   returned immediately and a background refresh is spawned.
    /// - MISS: nothing usable stored; the feed is fetched, compressed and stored
    ///   before returning. If that fails, the store is read once more and any
    ///   snapshot found there is returned regardless of age.
    ///
    /// Fails only on MISS when both the refresh and the fallback come up empty.
    pub async fn resolve(&self) -> Result<Resolution> {
        let now = self.clock.now_ms();

        if let Some((snapshot, entry)) = self.read_cached().await {
            let age_ms = entry.age_ms(now);

            if entry.is_fresh(now, self.ttl_ms()) {
                debug!("Cache HIT, age {:?} ms", age_ms);
                self.stats.write().await.record_hit();
                return Ok(Resolution {
                    snapshot,
                    status: CacheStatus::Hit,
                    age_ms,
                    background: None,
                });
            }

            debug!("Cache STALE, age {:?} ms, refreshing in background", age_ms);
            self.stats.write().await.record_stale();
            let background = self.spawn_refresh();
            return Ok(Resolution {
                snapshot,
                status: CacheStatus::Stale,
                age_ms,
                background,
            });
        }

        debug!("Cache MISS, refreshing synchronously");
        self.stats.write().await.record_miss();
        let (snapshot, age_ms) = self.refresh_or_fallback().await?;
        Ok(Resolution {
            snapshot,
            status: CacheStatus::Miss,
            age_ms,
            background: None,
        })
    }

    // == Refresh ==
    /// Fetches the feed, compresses it and overwrites the stored pair.
    pub async fn refresh(&self) -> Result<Snapshot> {
        let snapshot = self.fetch_snapshot().await?;
        self.store_snapshot(&snapshot).await?;
        Ok(snapshot)
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }

    /// Reads and decodes the stored pair. Read failures and undecodable
    /// snapshots both count as "nothing stored".
    async fn read_cached(&self) -> Option<(Snapshot, CacheEntry)> {
        let entry = match self.store.get().await {
            Ok(entry) => entry?,
            Err(err) => {
                warn!("Cache read failed, treating as empty: {}", err);
                return None;
            }
        };

        match entry.decode() {
            Ok(snapshot) => Some((snapshot, entry)),
            Err(err) => {
                warn!("Cached snapshot could not be decoded, treating as empty: {}", err);
                None
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        match self.upstream.fetch().await {
            Ok(records) => Ok(compress(records)),
            Err(err) => {
                self.stats.write().await.record_refresh_failure();
                Err(err)
            }
        }
    }

    async fn store_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let serialized = snapshot.to_json().map_err(|err| {
            TrackerError::StoreUnavailable(format!("Snapshot serialization failed: {}", err))
        })?;
        info!(
            "Compressed data size: {} bytes ({:.2} MB)",
            serialized.len(),
            serialized.len() as f64 / 1024.0 / 1024.0
        );

        let result = self.store.put(serialized, self.clock.now_ms()).await;
        let mut stats = self.stats.write().await;
        match &result {
            Ok(()) => stats.record_refresh(),
            Err(_) => stats.record_refresh_failure(),
        }
        result
    }

    /// Blocking refresh for the MISS path.
    ///
    /// A snapshot that was fetched but could not be stored is still served.
    async fn refresh_or_fallback(&self) -> Result<(Snapshot, Option<u64>)> {
        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => return self.fallback(err).await,
        };

        if let Err(err) = self.store_snapshot(&snapshot).await {
            warn!("Refreshed snapshot not stored, serving it uncached: {}", err);
        }
        Ok((snapshot, Some(0)))
    }

    async fn fallback(&self, err: TrackerError) -> Result<(Snapshot, Option<u64>)> {
        let now = self.clock.now_ms();
        match self.read_cached().await {
            Some((snapshot, entry)) => {
                warn!("Refresh failed ({}), using stale cache as fallback", err);
                self.stats.write().await.record_fallback();
                Ok((snapshot, entry.age_ms(now)))
            }
            None => Err(err),
        }
    }

    fn spawn_refresh(&self) -> Option<JoinHandle<()>> {
        let guard = if self.coalesce {
            if self.refreshing.swap(true, Ordering::AcqRel) {
                debug!("Background refresh already in flight");
                return None;
            }
            Some(RefreshGuard {
                flag: self.refreshing.clone(),
            })
        } else {
            None
        };

        Some(spawn_background_refresh(self.clone(), guard))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, SNAPSHOT_KEY};
    use crate::feed::{RawRecord, Scalar};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::sync::Mutex;

    const T: u64 = 1_700_000_000_000;
    const TTL: Duration = Duration::from_secs(30);

    // == Test Doubles ==
    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn at(ms: u64) -> Arc<Self> {
            Arc::new(Self(AtomicU64::new(ms)))
        }

        fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Feed double: serves fixed rows, or fails when rows are None.
    struct FakeUpstream {
        rows: Mutex<Option<Vec<RawRecord>>>,
        calls: AtomicUsize,
    }

    impl FakeUpstream {
        fn serving(rows: Vec<RawRecord>) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(Some(rows)),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(None),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn fetch(&self) -> Result<Vec<RawRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TrackerError::UpstreamUnavailable("API returned 503".into()))
        }
    }

    /// Store double that can fail a number of reads or every write.
    struct FlakyStore {
        inner: MemoryStore,
        failing_reads: AtomicUsize,
        failing_writes: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryStore::new(usize::MAX),
                failing_reads: AtomicUsize::new(0),
                failing_writes: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl CacheStore for FlakyStore {
        async fn get(&self) -> Result<Option<CacheEntry>> {
            let remaining = self.failing_reads.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failing_reads.store(remaining - 1, Ordering::SeqCst);
                return Err(TrackerError::StoreUnavailable("read timeout".into()));
            }
            self.inner.get().await
        }

        async fn put(&self, snapshot: String, fetched_at: u64) -> Result<()> {
            if self.failing_writes.load(Ordering::SeqCst) {
                return Err(TrackerError::StoreUnavailable("write rejected".into()));
            }
            self.inner.put(snapshot, fetched_at).await
        }
    }

    fn bus(id: &str, line: &str, ts: &str) -> RawRecord {
        RawRecord {
            ordem: Some(Scalar::from(id)),
            linha: Some(Scalar::from(line)),
            latitude: Some(Scalar::from(-22.9)),
            longitude: Some(Scalar::from(-43.2)),
            velocidade: Some(Scalar::from(10)),
            datahora: Some(Scalar::from(ts)),
        }
    }

    fn coordinator(
        store: Arc<dyn CacheStore>,
        upstream: Arc<dyn Upstream>,
        clock: Arc<ManualClock>,
    ) -> FreshnessCoordinator {
        FreshnessCoordinator::new(store, upstream, TTL).with_clock(clock)
    }

    async fn seed(store: &dyn CacheStore, rows: Vec<RawRecord>, at: u64) -> Snapshot {
        let snapshot = compress(rows);
        store.put(snapshot.to_json().unwrap(), at).await.unwrap();
        snapshot
    }

    // == MISS ==

    #[tokio::test]
    async fn test_miss_fetches_compresses_and_stores() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "1"), bus("A1", "485", "2")]);
        let clock = ManualClock::at(T);
        let coordinator = coordinator(store.clone(), upstream.clone(), clock);

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Miss);
        assert_eq!(resolution.snapshot.len(), 1);
        assert_eq!(resolution.age_secs(), 0);
        assert!(resolution.background.is_none());
        assert_eq!(upstream.calls(), 1);

        let entry = store.get().await.unwrap().unwrap();
        assert_eq!(entry.fetched_at, Some(T));
        assert_eq!(entry.decode().unwrap(), resolution.snapshot);
    }

    #[tokio::test]
    async fn test_miss_without_fallback_fails() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let upstream = FakeUpstream::failing();
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T));

        let result = coordinator.resolve().await;

        assert!(matches!(result, Err(TrackerError::UpstreamUnavailable(_))));
        assert_eq!(upstream.calls(), 1);
        let stats = coordinator.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.refresh_failures, 1);
    }

    #[tokio::test]
    async fn test_miss_serves_fresh_data_when_store_write_fails() {
        let store = FlakyStore::new();
        store.failing_writes.store(true, Ordering::SeqCst);
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "1")]);
        let coordinator = coordinator(store.clone(), upstream, ManualClock::at(T));

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Miss);
        assert_eq!(resolution.snapshot.len(), 1);
        assert!(store.get().await.unwrap().is_none());
        let stats = coordinator.stats().await;
        assert_eq!(stats.refresh_failures, 1);
        assert_eq!(stats.refreshes, 0);
    }

    #[tokio::test]
    async fn test_miss_falls_back_to_stored_snapshot() {
        let store = FlakyStore::new();
        let old = seed(&*store, vec![bus("A1", "485", "1")], T - 600_000).await;
        // First read fails, so the request is handled as MISS
        store.failing_reads.store(1, Ordering::SeqCst);
        let upstream = FakeUpstream::failing();
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T));

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Miss);
        assert_eq!(resolution.snapshot, old);
        assert_eq!(resolution.age_secs(), 600);
        assert_eq!(upstream.calls(), 1);
        assert_eq!(coordinator.stats().await.fallbacks, 1);
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_is_a_miss() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        store.insert_raw(SNAPSHOT_KEY, "[{broken").await;
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "1")]);
        let coordinator = coordinator(store.clone(), upstream.clone(), ManualClock::at(T));

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Miss);
        assert_eq!(upstream.calls(), 1);
        assert!(store.get().await.unwrap().unwrap().decode().is_ok());
    }

    // == HIT ==

    #[tokio::test]
    async fn test_hit_inside_ttl_makes_no_upstream_call() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let cached = seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::serving(vec![bus("B2", "343", "2")]);
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T + 29_000));

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Hit);
        assert_eq!(resolution.snapshot, cached);
        assert_eq!(resolution.age_secs(), 29);
        assert!(resolution.background.is_none());
        assert_eq!(upstream.calls(), 0);
    }

    // == STALE ==

    #[tokio::test]
    async fn test_stale_serves_old_snapshot_and_refreshes_once() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let old = seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "9"), bus("B2", "343", "9")]);
        let clock = ManualClock::at(T + 31_000);
        let coordinator = coordinator(store.clone(), upstream.clone(), clock.clone());

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Stale);
        assert_eq!(resolution.snapshot, old);
        assert_eq!(resolution.age_secs(), 31);

        resolution.background.expect("refresh spawned").await.unwrap();
        assert_eq!(upstream.calls(), 1);

        let entry = store.get().await.unwrap().unwrap();
        assert_eq!(entry.fetched_at, Some(T + 31_000));
        assert_eq!(entry.decode().unwrap().len(), 2);

        // The refreshed pair is fresh for the next request
        let next = coordinator.resolve().await.unwrap();
        assert_eq!(next.status, CacheStatus::Hit);
        assert_eq!(next.snapshot.len(), 2);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_at_exact_ttl() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "2")]);
        let coordinator = coordinator(store, upstream, ManualClock::at(T + 30_000));

        let resolution = coordinator.resolve().await.unwrap();
        assert_eq!(resolution.status, CacheStatus::Stale);
    }

    #[tokio::test]
    async fn test_snapshot_without_timestamp_is_stale() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        store.insert_raw(SNAPSHOT_KEY, r#"[{"ordem":"A1","linha":"485"}]"#).await;
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "2")]);
        let coordinator = coordinator(store, upstream, ManualClock::at(T));

        let resolution = coordinator.resolve().await.unwrap();

        assert_eq!(resolution.status, CacheStatus::Stale);
        assert_eq!(resolution.age_ms, None);
        assert_eq!(resolution.age_secs(), 0);
        resolution.background.expect("refresh spawned").await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_with_failing_upstream_still_serves() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let old = seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::failing();
        let coordinator = coordinator(store.clone(), upstream.clone(), ManualClock::at(T + 60_000));

        let resolution = coordinator.resolve().await.unwrap();
        assert_eq!(resolution.snapshot, old);

        // Background failure is swallowed: the task itself completes normally
        resolution.background.expect("refresh spawned").await.unwrap();
        assert_eq!(upstream.calls(), 1);
        assert_eq!(coordinator.stats().await.refresh_failures, 1);

        let entry = store.get().await.unwrap().unwrap();
        assert_eq!(entry.fetched_at, Some(T));
    }

    #[tokio::test]
    async fn test_concurrent_stale_requests_coalesce() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "2")]);
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T + 31_000));

        let first = coordinator.resolve().await.unwrap();
        let second = coordinator.resolve().await.unwrap();

        assert!(first.background.is_some());
        assert!(second.background.is_none());

        first.background.unwrap().await.unwrap();
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_guard_released_after_refresh() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::failing();
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T + 31_000));

        let first = coordinator.resolve().await.unwrap();
        first.background.unwrap().await.unwrap();

        // Previous refresh failed and finished, so a new one may start
        let second = coordinator.resolve().await.unwrap();
        assert_eq!(second.status, CacheStatus::Stale);
        second.background.expect("refresh spawned again").await.unwrap();
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_without_coalescing_every_stale_request_spawns() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        seed(&*store, vec![bus("A1", "485", "1")], T).await;
        let upstream = FakeUpstream::failing();
        let coordinator = coordinator(store, upstream.clone(), ManualClock::at(T + 31_000))
            .with_coalescing(false);

        let first = coordinator.resolve().await.unwrap();
        let second = coordinator.resolve().await.unwrap();

        first.background.expect("first refresh").await.unwrap();
        second.background.expect("second refresh").await.unwrap();
        assert_eq!(upstream.calls(), 2);
    }

    #[tokio::test]
    async fn test_stats_track_decisions() {
        let store = Arc::new(MemoryStore::new(usize::MAX));
        let upstream = FakeUpstream::serving(vec![bus("A1", "485", "1")]);
        let clock = ManualClock::at(T);
        let coordinator = coordinator(store, upstream, clock.clone());

        coordinator.resolve().await.unwrap(); // miss
        coordinator.resolve().await.unwrap(); // hit
        clock.set(T + 45_000);
        let stale = coordinator.resolve().await.unwrap(); // stale
        stale.background.unwrap().await.unwrap();

        let stats = coordinator.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.refreshes, 2);
    }

    #[test]
    fn test_status_tags() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(CacheStatus::Stale.to_string(), "STALE");
        assert_eq!(CacheStatus::Miss.to_string(), "MISS");
    }

    #[test]
    fn test_age_secs_rounds() {
        let resolution = Resolution {
            snapshot: Snapshot::default(),
            status: CacheStatus::Hit,
            age_ms: Some(29_600),
            background: None,
        };
        assert_eq!(resolution.age_secs(), 30);
    }
}
