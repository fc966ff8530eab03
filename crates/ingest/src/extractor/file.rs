//! Replays a saved bid page from disk.

use async_trait::async_trait;
use cashbid_core::{BidSource, ExtractionError, RawBidSheet};
use chrono::Utc;
use std::path::PathBuf;

use super::html::BidPageParser;

pub struct FileBidSource {
    path: PathBuf,
    parser: BidPageParser,
}

impl FileBidSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, location: Option<String>) -> Self {
        Self {
            path: path.into(),
            parser: BidPageParser::new(location),
        }
    }
}

#[async_trait]
impl BidSource for FileBidSource {
    async fn fetch_bids(&self) -> Result<RawBidSheet, ExtractionError> {
        let html = tokio::fs::read_to_string(&self.path).await?;
        self.parser.parse(&html, Utc::now())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbid_core::Commodity;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_saved_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "<table><tr><td>Soybeans</td><td>Nov</td><td>$10.05</td><td>-0.90</td></tr></table>"
        )
        .unwrap();

        let sheet = FileBidSource::new(file.path(), None)
            .fetch_bids()
            .await
            .unwrap();

        let beans = sheet.get(Commodity::Soybeans).unwrap();
        assert_eq!(beans.price, "$10.05");
        assert_eq!(beans.basis.as_deref(), Some("-0.90"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FileBidSource::new("/nonexistent/bids.html", None)
            .fetch_bids()
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
