//! Error taxonomy shared by the extraction and normalization stages.

use crate::commodity::Commodity;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a bid sheet from the source page.
///
/// Always run-level: the coordinator finalizes the run as failed.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Network or navigation failure before a response arrived.
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("extraction cancelled")]
    Cancelled,

    /// The page loaded but no bid rows could be located.
    #[error("page layout not recognised: {0}")]
    LayoutChanged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to turn one commodity's raw text into an observation.
///
/// Per-commodity: the commodity is recorded as missing and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("{commodity}: no parseable price in {raw:?}")]
    MalformedPrice { commodity: Commodity, raw: String },

    #[error("{commodity}: price {price} outside accepted range {min}..{max}")]
    OutOfRange {
        commodity: Commodity,
        price: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

impl NormalizationError {
    #[must_use]
    pub fn commodity(&self) -> Commodity {
        match self {
            Self::MalformedPrice { commodity, .. } | Self::OutOfRange { commodity, .. } => {
                *commodity
            }
        }
    }
}
