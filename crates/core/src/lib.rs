pub mod bids;
pub mod commodity;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;

pub use bids::{RawBid, RawBidSheet};
pub use commodity::Commodity;
pub use config::{
    AppConfig, DatabaseConfig, PipelineConfig, PriceBand, RetentionPolicy, SourceConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{ExtractionError, NormalizationError};
pub use traits::BidSource;
