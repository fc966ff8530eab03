//! Storage seams used by the ingestion pipeline and by read-only consumers.
//!
//! Both traits are append-or-read only; no method updates or removes a stored row.

use async_trait::async_trait;
use cashbid_core::Commodity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::models::{PriceObservation, ScrapeRun, StoredId};

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub id: StoredId,
    /// False when a row with the same `(commodity, observed_at)` already existed.
    pub inserted: bool,
}

/// Filter for history reads. Bounds are inclusive; `None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub commodity: Option<Commodity>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    #[must_use]
    pub fn for_commodity(commodity: Commodity) -> Self {
        Self {
            commodity: Some(commodity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// True when the observation passes every filter.
    #[must_use]
    pub fn matches(&self, obs: &PriceObservation) -> bool {
        self.commodity.map_or(true, |c| c == obs.commodity)
            && self.from.map_or(true, |from| obs.observed_at >= from)
            && self.to.map_or(true, |to| obs.observed_at <= to)
    }
}

/// Append-only time series of price observations.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Appends one observation as a single atomic insert.
    ///
    /// A second append with the same `(commodity, observed_at)` is a no-op that
    /// returns the existing row's id with `inserted = false`.
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError>;

    /// Most recent observation by `observed_at` for a commodity.
    async fn latest(&self, commodity: Commodity) -> Result<Option<PriceObservation>, StorageError>;

    /// Observations matching `query`, ordered by `observed_at` ascending.
    async fn query(&self, query: &HistoryQuery) -> Result<Vec<PriceObservation>, StorageError>;

    /// Up to `limit` most recent prices for a commodity, newest first.
    async fn recent_prices(
        &self,
        commodity: Commodity,
        limit: u32,
    ) -> Result<Vec<Decimal>, StorageError>;

    /// Latest observation of every stored commodity, ordered by commodity.
    async fn latest_all(&self) -> Result<Vec<PriceObservation>, StorageError>;

    /// Distinct commodities that have at least one stored observation.
    async fn commodities(&self) -> Result<Vec<Commodity>, StorageError>;
}

/// Durable log of finalized scrape runs.
#[async_trait]
pub trait RunLog: Send + Sync {
    /// Records a finalized run. Each run is written exactly once.
    async fn record_run(&self, run: &ScrapeRun) -> Result<(), StorageError>;

    /// Most recent runs, newest first.
    async fn recent_runs(&self, limit: u32) -> Result<Vec<ScrapeRun>, StorageError>;
}

/// Median of a price window; `None` for an empty window.
#[must_use]
pub fn median(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    let mut sorted = prices.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO)
    } else {
        Some(sorted[mid])
    }
}
