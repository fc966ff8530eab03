//! Bid sources: live HTTP page or saved snapshot, sharing one HTML parser.

pub mod file;
pub mod html;
pub mod http;

pub use file::FileBidSource;
pub use html::BidPageParser;
pub use http::HttpBidSource;

use cashbid_core::{BidSource, ExtractionError, SourceConfig};

/// Builds the configured source: a snapshot file when `snapshot_path` is set,
/// the live page otherwise.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn BidSource>, ExtractionError> {
    match &config.snapshot_path {
        Some(path) => Ok(Box::new(FileBidSource::new(path, config.location.clone()))),
        None => Ok(Box::new(HttpBidSource::new(config)?)),
    }
}
