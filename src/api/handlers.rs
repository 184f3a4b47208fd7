//! API Handlers
//!
//! HTTP request handlers for each bus tracker endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{CacheStore, FreshnessCoordinator, MemoryStore};
use crate::config::Config;
use crate::error::Result;
use crate::feed::{HttpUpstream, Upstream};
use crate::models::{BusQuery, HealthResponse, StatsResponse, UsageResponse};
use crate::query::project;

// == Response Headers ==
pub const X_CACHE_AGE: HeaderName = HeaderName::from_static("x-cache-age");
pub const X_CACHE_STATUS: HeaderName = HeaderName::from_static("x-cache-status");
pub const X_TOTAL_BUSES: HeaderName = HeaderName::from_static("x-total-buses");
pub const X_FILTERED_BUSES: HeaderName = HeaderName::from_static("x-filtered-buses");
pub const X_SLIM_MODE: HeaderName = HeaderName::from_static("x-slim-mode");

/// Client-side caching policy sent with every bus listing
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=5, stale-while-revalidate=30";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: FreshnessCoordinator,
}

impl AppState {
    /// Creates a new AppState around an existing coordinator.
    pub fn new(coordinator: FreshnessCoordinator) -> Self {
        Self { coordinator }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires the HTTP feed client and the in-process store into a coordinator.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new(config.max_value_bytes));
        let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::from_config(config)?);
        let coordinator =
            FreshnessCoordinator::new(store, upstream, Duration::from_secs(config.cache_ttl))
                .with_coalescing(config.coalesce_refresh);
        Ok(Self::new(coordinator))
    }
}

/// Handler for GET /
///
/// Lists buses on the requested lines. Without any line, answers with the
/// usage document and never touches the cache or the feed.
pub async fn buses_handler(
    State(state): State<AppState>,
    Query(query): Query<BusQuery>,
) -> Result<Response> {
    let filter = query.to_filter();
    if filter.is_empty() {
        return Ok(Json(UsageResponse::default()).into_response());
    }

    let resolution = state.coordinator.resolve().await?;
    let projection = project(&resolution.snapshot, &filter);

    let headers = [
        (header::CACHE_CONTROL, CACHE_CONTROL_VALUE.to_string()),
        (X_CACHE_AGE, format!("{}s", resolution.age_secs())),
        (X_CACHE_STATUS, resolution.status.to_string()),
        (X_TOTAL_BUSES, resolution.snapshot.len().to_string()),
        (X_FILTERED_BUSES, projection.len().to_string()),
        (X_SLIM_MODE, if filter.slim { "1" } else { "0" }.to_string()),
    ];

    // Any background refresh keeps running detached from this response
    drop(resolution.background);

    Ok((headers, Json(projection)).into_response())
}

/// Handler for GET /stats
///
/// Returns freshness and refresh counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.coordinator.stats().await;
    Json(StatsResponse::new(&stats, state.coordinator.ttl().as_secs()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
