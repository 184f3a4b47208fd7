//! Query Module
//!
//! Request-time line filtering and slim projection over a snapshot.

mod filter;
mod projector;


pub use filter::{line_matches, QueryFilter};
pub use projector::{project, Projection};
