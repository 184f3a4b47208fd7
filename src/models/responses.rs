//! Response DTOs for the bus tracker API
//!
//! Defines the structure of outgoing HTTP response bodies. Successful bus
//! listings are serialized straight from `query::Projection`.

use serde::Serialize;

use crate::cache::CacheStats;

/// Usage document returned when no line was requested
#[derive(Debug, Clone, Serialize)]
pub struct UsageResponse {
    pub status: String,
    pub message: String,
    pub example: String,
    pub slim: String,
}

impl Default for UsageResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Bus Tracker API - use ?linha=XXX to filter".to_string(),
            example: "?linha=485 or ?lines=485,343".to_string(),
            slim: "?slim=1 for a lighter payload".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests served from a fresh snapshot
    pub hits: u64,
    /// Requests served from a stale snapshot
    pub stale: u64,
    /// Requests that waited on the feed
    pub misses: u64,
    /// Completed feed refreshes
    pub refreshes: u64,
    /// Failed feed refreshes or store writes
    pub refresh_failures: u64,
    /// Failed refreshes answered from the store
    pub fallbacks: u64,
    /// Share of requests answered without waiting on the feed
    pub hit_rate: f64,
    /// Freshness window in seconds
    pub ttl_seconds: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from coordinator statistics
    pub fn new(stats: &CacheStats, ttl_seconds: u64) -> Self {
        Self {
            hits: stats.hits,
            stale: stats.stale,
            misses: stats.misses,
            refreshes: stats.refreshes,
            refresh_failures: stats.refresh_failures,
            fallbacks: stats.fallbacks,
            hit_rate: stats.hit_rate(),
            ttl_seconds,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Short error label
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
