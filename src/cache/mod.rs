//! Cache Module
//!
//! Backing store abstraction, freshness policy and cache statistics.

mod clock;
mod coordinator;
mod entry;
mod stats;
mod store;

// Re-export public types
pub use clock::{Clock, SystemClock};
pub(crate) use coordinator::RefreshGuard;
pub use coordinator::{CacheStatus, FreshnessCoordinator, Resolution};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::{CacheStore, MemoryStore};

// == Public Constants ==
/// Store key holding the serialized snapshot
pub const SNAPSHOT_KEY: &str = "rio_buses_slim";

/// Store key holding the fetch timestamp as a decimal string
pub const TIMESTAMP_KEY: &str = "rio_buses_ts";

/// Default freshness window in seconds
pub const DEFAULT_TTL_SECS: u64 = 30;
