//! Background Tasks Module
//!
//! Work that runs detached from the request that triggered it.
//!
//! # Tasks
//! - Background refresh: refetches the feed after a request was served a stale snapshot

mod refresh;

pub(crate) use refresh::spawn_background_refresh;
