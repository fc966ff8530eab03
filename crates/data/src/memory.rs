//! In-process store with the same contract as the PostgreSQL repositories.
//!
//! Backs `scrape --dry-run` and the pipeline tests. Contents live only as
//! long as the value.

use async_trait::async_trait;
use cashbid_core::Commodity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::models::{PriceObservation, ScrapeRun, StoredId};
use crate::store::{AppendOutcome, HistoryQuery, PriceStore, RunLog};

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order; ids are `index + 1`
    rows: Vec<PriceObservation>,
    keys: HashMap<(Commodity, DateTime<Utc>), StoredId>,
    runs: Vec<ScrapeRun>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored observations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }

    /// All observations in insertion order.
    pub async fn observations(&self) -> Vec<PriceObservation> {
        self.inner.read().await.rows.clone()
    }

    /// All recorded runs in insertion order.
    pub async fn runs(&self) -> Vec<ScrapeRun> {
        self.inner.read().await.runs.clone()
    }

    fn sorted_for(rows: &[PriceObservation], commodity: Commodity) -> Vec<&PriceObservation> {
        let mut matching: Vec<&PriceObservation> =
            rows.iter().filter(|o| o.commodity == commodity).collect();
        // stable: equal timestamps keep insertion order
        matching.sort_by_key(|o| o.observed_at);
        matching
    }
}

#[async_trait]
impl PriceStore for InMemoryStore {
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError> {
        let mut inner = self.inner.write().await;

        if let Some(id) = inner.keys.get(&observation.key()) {
            return Ok(AppendOutcome {
                id: *id,
                inserted: false,
            });
        }

        let id = StoredId(i64::try_from(inner.rows.len()).unwrap_or(i64::MAX) + 1);
        inner.rows.push(observation.clone());
        inner.keys.insert(observation.key(), id);

        Ok(AppendOutcome { id, inserted: true })
    }

    async fn latest(&self, commodity: Commodity) -> Result<Option<PriceObservation>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::sorted_for(&inner.rows, commodity)
            .last()
            .map(|o| (*o).clone()))
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<PriceObservation>, StorageError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<PriceObservation> = inner
            .rows
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.observed_at);
        Ok(rows)
    }

    async fn recent_prices(
        &self,
        commodity: Commodity,
        limit: u32,
    ) -> Result<Vec<Decimal>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::sorted_for(&inner.rows, commodity)
            .iter()
            .rev()
            .take(limit as usize)
            .map(|o| o.price)
            .collect())
    }

    async fn latest_all(&self) -> Result<Vec<PriceObservation>, StorageError> {
        let inner = self.inner.read().await;
        let mut latest: BTreeMap<Commodity, &PriceObservation> = BTreeMap::new();
        for row in &inner.rows {
            let newer = latest
                .get(&row.commodity)
                .map_or(true, |current| row.observed_at >= current.observed_at);
            if newer {
                latest.insert(row.commodity, row);
            }
        }
        let mut rows: Vec<PriceObservation> = latest.into_values().cloned().collect();
        rows.sort_by_key(|o| o.commodity.as_str());
        Ok(rows)
    }

    async fn commodities(&self) -> Result<Vec<Commodity>, StorageError> {
        let inner = self.inner.read().await;
        let mut commodities: Vec<Commodity> = inner.rows.iter().map(|o| o.commodity).collect();
        commodities.sort_by_key(|c| c.as_str());
        commodities.dedup();
        Ok(commodities)
    }
}

#[async_trait]
impl RunLog for InMemoryStore {
    async fn record_run(&self, run: &ScrapeRun) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.runs.iter().all(|r| r.run_id != run.run_id) {
            inner.runs.push(run.clone());
        }
        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> Result<Vec<ScrapeRun>, StorageError> {
        let inner = self.inner.read().await;
        let mut runs = inner.runs.clone();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit as usize);
        Ok(runs)
    }
}
