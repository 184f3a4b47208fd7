//! Bus Tracker - Read-through cache for a real-time bus position feed
//!
//! Downloads the feed, compresses it into a per-vehicle snapshot small enough
//! for the backing store, and serves line-filtered views of it with a
//! stale-while-revalidate freshness policy.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, TrackerError};
