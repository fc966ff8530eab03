//! Cash bid ingestion: extract a bid page, normalize each commodity, decide
//! what changed, append it, and summarize the run.

pub mod coordinator;
pub mod dedup;
pub mod extractor;
pub mod normalizer;

pub use coordinator::{RunCoordinator, RunPhase};
pub use dedup::{ChangeDetector, Decision, PersistReason, SkipReason};
pub use extractor::{source_from_config, BidPageParser, FileBidSource, HttpBidSource};
pub use normalizer::{parse_decimal, Normalizer};
