//! PostgreSQL repositories for the cash bid store.
//!
//! Each repository wraps one table and implements the matching store trait.

pub mod observation_repo;
pub mod scrape_run_repo;

pub use observation_repo::PriceObservationRepository;
pub use scrape_run_repo::ScrapeRunRepository;

use async_trait::async_trait;
use cashbid_core::Commodity;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::StorageError;
use crate::models::{PriceObservation, ScrapeRun};
use crate::store::{AppendOutcome, HistoryQuery, PriceStore, RunLog};

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub observations: PriceObservationRepository,
    pub runs: ScrapeRunRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            observations: PriceObservationRepository::new(pool.clone()),
            runs: ScrapeRunRepository::new(pool),
        }
    }
}

#[async_trait]
impl PriceStore for Repositories {
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError> {
        self.observations.append(observation).await
    }

    async fn latest(&self, commodity: Commodity) -> Result<Option<PriceObservation>, StorageError> {
        self.observations.latest(commodity).await
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<PriceObservation>, StorageError> {
        self.observations.query(query).await
    }

    async fn recent_prices(
        &self,
        commodity: Commodity,
        limit: u32,
    ) -> Result<Vec<Decimal>, StorageError> {
        self.observations.recent_prices(commodity, limit).await
    }

    async fn latest_all(&self) -> Result<Vec<PriceObservation>, StorageError> {
        self.observations.latest_all().await
    }

    async fn commodities(&self) -> Result<Vec<Commodity>, StorageError> {
        self.observations.commodities().await
    }
}

#[async_trait]
impl RunLog for Repositories {
    async fn record_run(&self, run: &ScrapeRun) -> Result<(), StorageError> {
        self.runs.record_run(run).await
    }

    async fn recent_runs(&self, limit: u32) -> Result<Vec<ScrapeRun>, StorageError> {
        self.runs.recent_runs(limit).await
    }
}
