use crate::bids::RawBidSheet;
use crate::error::ExtractionError;
use async_trait::async_trait;

/// Provider of raw bid text, one entry per commodity the page rendered.
#[async_trait]
pub trait BidSource: Send + Sync {
    async fn fetch_bids(&self) -> Result<RawBidSheet, ExtractionError>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}
