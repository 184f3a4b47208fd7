//! Upstream Client
//!
//! Fetches the raw vehicle-position feed over HTTP.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::feed::RawRecord;

/// Source of raw feed rows.
///
/// One call is one outbound request. Implementations do not retry; the
/// coordinator owns the fallback policy.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Downloads and decodes the whole feed.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

// == HTTP Upstream ==
/// Feed client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: String,
}

impl HttpUpstream {
    /// Creates a client for the given feed URL.
    ///
    /// # Arguments
    /// * `url` - Feed endpoint returning a JSON array
    /// * `user_agent` - User-Agent header sent with every request
    pub fn new(url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Creates a client from the server configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.feed_url.clone(), &config.user_agent)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::UpstreamUnavailable(format!(
                "API returned {}",
                status.as_u16()
            )));
        }

        let records: Vec<RawRecord> = response.json().await?;
        debug!("Fetched {} raw rows from {}", records.len(), self.url);
        Ok(records)
    }
}
