//! API Module
//!
//! HTTP handlers and routing for the bus tracker REST API.
//!
//! # Endpoints
//! - `GET /?lines=485,343&slim=1` - Buses on the requested lines
//! - `GET /stats` - Freshness and refresh counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
