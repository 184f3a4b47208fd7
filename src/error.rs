//! Error types for the bus tracker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Tracker Error Enum ==
/// Unified error type for the bus tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The feed answered with a non-success status, or could not be reached or decoded
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The backing store failed a read or write
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::UpstreamUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            TrackerError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "Upstream Unavailable"),
            TrackerError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Store Unavailable")
            }
        };

        let body = Json(ErrorResponse::new(label, self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the bus tracker.
pub type Result<T> = std::result::Result<T, TrackerError>;
