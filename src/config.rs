//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use crate::cache::DEFAULT_TTL_SECS;

/// Default upstream feed endpoint.
pub const DEFAULT_FEED_URL: &str = "https://dados.mobilidade.rio/gps/sppo";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream feed URL
    pub feed_url: String,
    /// Freshness window in seconds
    pub cache_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Largest value the backing store accepts, in bytes
    pub max_value_bytes: usize,
    /// User-Agent sent to the feed
    pub user_agent: String,
    /// Allow only one background refresh in flight at a time
    pub coalesce_refresh: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FEED_URL` - Upstream feed URL (default: Rio SPPO GPS feed)
    /// - `CACHE_TTL` - Freshness window in seconds (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_VALUE_BYTES` - Store value ceiling (default: 25 MiB)
    /// - `USER_AGENT` - User-Agent for feed requests (default: BusTracker/2.0)
    /// - `COALESCE_REFRESH` - Single-flight background refresh (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            feed_url: env::var("FEED_URL").unwrap_or(defaults.feed_url),
            cache_ttl: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            max_value_bytes: env::var("MAX_VALUE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_value_bytes),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            coalesce_refresh: env::var("COALESCE_REFRESH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.coalesce_refresh),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            cache_ttl: DEFAULT_TTL_SECS,
            server_port: 3000,
            max_value_bytes: 25 * 1024 * 1024,
            user_agent: "BusTracker/2.0".to_string(),
            coalesce_refresh: true,
        }
    }
}
