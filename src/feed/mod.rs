//! Feed Module
//!
//! Upstream download, record shapes and the compression pipeline that turns a
//! raw feed into a storable snapshot.

mod client;
mod compress;
mod record;
mod snapshot;


// Re-export public types
pub use client::{HttpUpstream, Upstream};
pub use compress::compress;
pub use record::{compare_timestamps, CompressedRecord, RawRecord, Scalar, SlimRecord};
pub use snapshot::Snapshot;
