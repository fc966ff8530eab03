//! One extraction cycle: fetch, normalize, detect changes, append, summarize.
//!
//! Run phases: `Started -> Extracting -> Finalizing -> {Success | Partial | Failed}`.
//! Per-commodity failures are isolated and recorded as missing. A source
//! failure or a storage failure ends the run as failed. The run summary is
//! written once, after every commodity attempt.

use cashbid_core::{BidSource, Commodity, ExtractionError, PipelineConfig, RawBidSheet};
use cashbid_data::{
    median, PriceObservation, PriceStore, RunLog, RunStatus, ScrapeRun, StorageError,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::dedup::{ChangeDetector, Decision};
use crate::normalizer::Normalizer;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Started,
    Extracting,
    Finalizing,
    Finished(RunStatus),
}

/// Mutable bookkeeping for the run in flight. Only the coordinator touches it;
/// `finalize` turns it into an immutable `ScrapeRun`.
#[derive(Debug)]
struct RunInProgress {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    phase: RunPhase,
    found: BTreeSet<Commodity>,
    rows_appended: u32,
    error_detail: Option<String>,
    aborted: bool,
}

impl RunInProgress {
    fn start(started_at: DateTime<Utc>) -> Self {
        let run = Self {
            run_id: Uuid::new_v4(),
            started_at,
            phase: RunPhase::Started,
            found: BTreeSet::new(),
            rows_appended: 0,
            error_detail: None,
            aborted: false,
        };
        tracing::debug!("run {} started", run.run_id);
        run
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::debug!("run {}: {:?} -> {:?}", self.run_id, self.phase, phase);
        self.phase = phase;
    }

    fn abort(&mut self, detail: String) {
        self.aborted = true;
        self.error_detail = Some(detail);
    }

    fn finalize(mut self, tracked: &[Commodity], finished_at: DateTime<Utc>) -> ScrapeRun {
        self.enter(RunPhase::Finalizing);

        let missing: BTreeSet<Commodity> = tracked
            .iter()
            .filter(|c| !self.found.contains(c))
            .copied()
            .collect();
        let found = tracked.len() - missing.len();

        let status = if self.aborted || found == 0 {
            RunStatus::Failed
        } else if missing.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::Partial
        };

        if status == RunStatus::Failed && self.error_detail.is_none() {
            self.error_detail = Some("no tracked commodity could be extracted".to_string());
        }
        self.enter(RunPhase::Finished(status));

        ScrapeRun {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at,
            status,
            commodities_found: u32::try_from(found).unwrap_or(u32::MAX),
            commodities_missing: missing,
            rows_appended: self.rows_appended,
            error_detail: self.error_detail,
        }
    }
}

/// Orchestrates runs against one source and one store.
pub struct RunCoordinator<P>
where
    P: PriceStore + RunLog,
{
    source: Box<dyn BidSource>,
    store: Arc<P>,
    normalizer: Normalizer,
    config: PipelineConfig,
    extraction_timeout: Duration,
}

impl<P> RunCoordinator<P>
where
    P: PriceStore + RunLog,
{
    #[must_use]
    pub fn new(
        source: Box<dyn BidSource>,
        store: Arc<P>,
        config: PipelineConfig,
        extraction_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            normalizer: Normalizer::new(&config),
            config,
            extraction_timeout,
        }
    }

    /// Tracked commodities, deduplicated, in configured order.
    fn tracked(&self) -> Vec<Commodity> {
        let mut seen = BTreeSet::new();
        self.config
            .commodities
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Executes one run and records its summary.
    ///
    /// `cancel` aborts the extraction step only; appended rows are never
    /// rolled back.
    ///
    /// # Errors
    /// Returns an error only if the run summary itself cannot be recorded.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ScrapeRun, StorageError> {
        let tracked = self.tracked();
        let mut progress = RunInProgress::start(Utc::now());

        progress.enter(RunPhase::Extracting);
        match self.extract(cancel).await {
            Ok(sheet) => self.ingest_sheet(&sheet, &tracked, &mut progress).await,
            Err(e) => {
                tracing::error!("Extraction from {} failed: {}", self.source.describe(), e);
                progress.abort(e.to_string());
            }
        }

        let run = progress.finalize(&tracked, Utc::now());
        tracing::info!("{}", run.summary());

        self.store.record_run(&run).await?;
        Ok(run)
    }

    async fn extract(&self, cancel: &CancellationToken) -> Result<RawBidSheet, ExtractionError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ExtractionError::Cancelled),
            res = tokio::time::timeout(self.extraction_timeout, self.source.fetch_bids()) => {
                res.unwrap_or(Err(ExtractionError::Timeout(self.extraction_timeout)))
            }
        }
    }

    async fn ingest_sheet(
        &self,
        sheet: &RawBidSheet,
        tracked: &[Commodity],
        progress: &mut RunInProgress,
    ) {
        let mut detector = ChangeDetector::new(self.config.retention);

        for &commodity in tracked {
            match self
                .ingest_one(commodity, sheet, progress.run_id, &mut detector)
                .await
            {
                Ok(Some(inserted)) => {
                    progress.found.insert(commodity);
                    if inserted {
                        progress.rows_appended += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("{}: storage failure, aborting run: {}", commodity, e);
                    progress.abort(format!("{commodity}: {e}"));
                    break;
                }
            }
        }
    }

    /// Returns `Some(inserted)` when the commodity counts as found, `None`
    /// when it is missing from the page or fails normalization.
    async fn ingest_one(
        &self,
        commodity: Commodity,
        sheet: &RawBidSheet,
        run_id: Uuid,
        detector: &mut ChangeDetector,
    ) -> Result<Option<bool>, StorageError> {
        let Some(raw) = sheet.get(commodity) else {
            tracing::warn!("{}: not found on page", commodity);
            return Ok(None);
        };

        let recent = self
            .store
            .recent_prices(commodity, self.config.median_window)
            .await?;

        let candidate = match self.normalizer.normalize_with_history(
            commodity,
            raw,
            sheet.fetched_at,
            median(&recent),
        ) {
            Ok(obs) => PriceObservation {
                run_id: Some(run_id),
                ..obs
            },
            Err(e) => {
                tracing::warn!("{}", e);
                return Ok(None);
            }
        };

        let last = self.store.latest(commodity).await?;
        match detector.decide(&candidate, last.as_ref()) {
            Decision::Skip(reason) => {
                tracing::debug!("{}: not appended ({:?})", commodity, reason);
                Ok(Some(false))
            }
            Decision::Persist(reason) => {
                let inserted = self.append_with_retry(&candidate).await?;
                detector.mark_recorded(&candidate);
                tracing::debug!(
                    "{}: {} ({:?}, inserted={})",
                    commodity,
                    candidate.price,
                    reason,
                    inserted
                );
                Ok(Some(inserted))
            }
        }
    }

    /// Appends are idempotent on `(commodity, observed_at)`, so retrying the
    /// same observation cannot create a second row.
    async fn append_with_retry(&self, obs: &PriceObservation) -> Result<bool, StorageError> {
        let attempts = self.config.append_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.store.append(obs).await {
                Ok(outcome) => return Ok(outcome.inserted),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "{}: append attempt {}/{} failed: {}",
                        obs.commodity,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
