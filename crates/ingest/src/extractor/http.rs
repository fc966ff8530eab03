//! Live page source: one HTTP GET, parsed in-process.
//!
//! No JavaScript rendering. Pages that build the bid table client-side need
//! a saved snapshot via [`super::FileBidSource`] instead.

use async_trait::async_trait;
use cashbid_core::{BidSource, ExtractionError, RawBidSheet, SourceConfig};
use chrono::Utc;
use std::time::Duration;

use super::html::BidPageParser;

pub struct HttpBidSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    parser: BidPageParser,
}

impl HttpBidSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> Result<Self, ExtractionError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ExtractionError::Unreachable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout,
            parser: BidPageParser::new(config.location.clone()),
        })
    }

    async fn fetch_html(&self) -> Result<String, ExtractionError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout(self.timeout)
            } else {
                ExtractionError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Http {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ExtractionError::Unreachable(format!("reading body: {e}")))
    }
}

#[async_trait]
impl BidSource for HttpBidSource {
    async fn fetch_bids(&self) -> Result<RawBidSheet, ExtractionError> {
        tracing::info!("Fetching cash bids from {}", self.url);
        let html = self.fetch_html().await?;
        let fetched_at = Utc::now();
        tracing::debug!("Received {} bytes", html.len());
        self.parser.parse(&html, fetched_at)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
