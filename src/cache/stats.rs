//! Cache Statistics Module
//!
//! Counts freshness decisions and refresh outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks how requests were served and how refreshes went.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests served from a fresh snapshot
    pub hits: u64,
    /// Requests served from a stale snapshot
    pub stale: u64,
    /// Requests that found no usable snapshot
    pub misses: u64,
    /// Refreshes whose snapshot was fetched and stored
    pub refreshes: u64,
    /// Refreshes that failed to fetch or to store; each counts once
    pub refresh_failures: u64,
    /// Failed refreshes answered from whatever the store still held
    pub fallbacks: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of requests answered without waiting on the feed.
    ///
    /// Returns (hits + stale) / requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.requests();
        if total == 0 {
            0.0
        } else {
            (self.hits + self.stale) as f64 / total as f64
        }
    }

    /// Total requests seen.
    pub fn requests(&self) -> u64 {
        self.hits + self.stale + self.misses
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    pub fn record_refresh_failure(&mut self) {
        self.refresh_failures += 1;
    }

    pub fn record_fallback(&mut self) {
        self.fallbacks += 1;
    }
}
