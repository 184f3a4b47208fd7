//! Request DTOs for the bus tracker API
//!
//! Defines the query string accepted by the bus listing endpoint.

use serde::Deserialize;

use crate::query::QueryFilter;

/// Query string for GET /
///
/// # Fields
/// - `lines`: Comma-separated line list
/// - `linha`: Same as `lines`; used only when `lines` is absent or empty
/// - `slim`: `1` turns on slim mode, anything else leaves it off
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusQuery {
    #[serde(default)]
    pub lines: Option<String>,
    #[serde(default)]
    pub linha: Option<String>,
    #[serde(default)]
    pub slim: Option<String>,
}

impl BusQuery {
    /// Builds the request filter from the query string.
    pub fn to_filter(&self) -> QueryFilter {
        let lines = self
            .lines
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(self.linha.as_deref())
            .unwrap_or_default();

        QueryFilter::parse(lines, self.slim.as_deref() == Some("1"))
    }
}
