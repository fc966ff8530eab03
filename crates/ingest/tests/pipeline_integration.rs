//! End-to-end runs: saved or served bid pages through the coordinator into
//! the in-memory store.

use async_trait::async_trait;
use cashbid_core::{
    BidSource, Commodity, ExtractionError, PipelineConfig, PriceBand, RawBidSheet,
    RetentionPolicy, SourceConfig,
};
use cashbid_data::{HistoryQuery, InMemoryStore, PriceObservation, PriceStore, RunLog, RunStatus};
use cashbid_ingest::{BidPageParser, FileBidSource, HttpBidSource, RunCoordinator};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cash_bids.html");

fn rolla() -> Option<String> {
    Some("Rolla".to_string())
}

fn coordinator(
    source: impl BidSource + 'static,
    store: Arc<InMemoryStore>,
    config: PipelineConfig,
) -> RunCoordinator<InMemoryStore> {
    RunCoordinator::new(Box::new(source), store, config, Duration::from_secs(5))
}

/// Serves the same parsed sheet, with the same timestamp, on every call.
struct FrozenPage(RawBidSheet);

impl FrozenPage {
    fn at(fetched_at: DateTime<Utc>) -> Self {
        let html = std::fs::read_to_string(FIXTURE).unwrap();
        Self(BidPageParser::new(rolla()).parse(&html, fetched_at).unwrap())
    }
}

#[async_trait]
impl BidSource for FrozenPage {
    async fn fetch_bids(&self) -> Result<RawBidSheet, ExtractionError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "frozen".to_string()
    }
}

#[tokio::test]
async fn test_saved_page_run_is_partial() {
    let store = Arc::new(InMemoryStore::new());

    let run = coordinator(
        FileBidSource::new(FIXTURE, rolla()),
        store.clone(),
        PipelineConfig::default(),
    )
    .run(&CancellationToken::new())
    .await
    .unwrap();

    // Rolla does not quote winter wheat
    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.status.exit_code(), 2);
    assert_eq!(run.commodities_found, 4);
    assert_eq!(
        run.commodities_missing,
        BTreeSet::from([Commodity::WinterWheat12Pro])
    );
    assert_eq!(run.rows_appended, 4);

    let corn = store.latest(Commodity::Corn).await.unwrap().unwrap();
    assert_eq!(corn.price, dec!(4.12), "first Rolla corn row wins");
    assert_eq!(corn.basis, Some(dec!(-0.45)));
    assert_eq!(corn.futures_change, Some(dec!(0.0275)));
    assert_eq!(corn.delivery.as_deref(), Some("Oct 2026"));
    assert_eq!(corn.run_id, Some(run.run_id));

    let canola = store.latest(Commodity::Canola).await.unwrap().unwrap();
    assert_eq!(canola.price, dec!(19.45));
    assert_eq!(canola.futures_change, Some(dec!(-0.12)));

    // every row of one run shares the page timestamp
    let stamps: BTreeSet<_> = store
        .observations()
        .await
        .iter()
        .map(|o| o.observed_at)
        .collect();
    assert_eq!(stamps.len(), 1);

    assert_eq!(store.recent_runs(10).await.unwrap(), vec![run]);
}

#[tokio::test]
async fn test_repeated_run_with_same_timestamp_adds_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
    let coordinator = coordinator(FrozenPage::at(at), store.clone(), PipelineConfig::default());

    let first = coordinator.run(&CancellationToken::new()).await.unwrap();
    let second = coordinator.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(first.rows_appended, 4);
    assert_eq!(second.rows_appended, 0);
    assert_eq!(second.status, RunStatus::Partial);
    assert_eq!(store.len().await, 4);
    assert_eq!(store.recent_runs(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retention_policies_on_unchanged_page() {
    for (retention, expected_rows) in [
        (RetentionPolicy::RetainAll, 8),
        (RetentionPolicy::CollapseUnchanged, 4),
    ] {
        let store = Arc::new(InMemoryStore::new());
        let config = PipelineConfig {
            retention,
            ..PipelineConfig::default()
        };

        for hour in [14, 15] {
            let at = Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap();
            let run = coordinator(FrozenPage::at(at), store.clone(), config.clone())
                .run(&CancellationToken::new())
                .await
                .unwrap();
            // an unchanged commodity still counts as found
            assert_eq!(run.commodities_found, 4);
        }

        assert_eq!(store.len().await, expected_rows, "{retention:?}");
    }
}

#[tokio::test]
async fn test_served_page_with_unpriced_commodity() {
    let server = MockServer::start().await;
    let page = std::fs::read_to_string(FIXTURE)
        .unwrap()
        .replace("$19.45", "N/A");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let source = HttpBidSource::new(&SourceConfig {
        url: format!("{}/grain", server.uri()),
        timeout_secs: 5,
        ..SourceConfig::default()
    })
    .unwrap();
    let store = Arc::new(InMemoryStore::new());

    let run = coordinator(source, store.clone(), PipelineConfig::default())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(
        run.commodities_missing,
        BTreeSet::from([Commodity::WinterWheat12Pro, Commodity::Canola])
    );
    assert_eq!(store.len().await, 3);
    assert!(store.latest(Commodity::Canola).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_source_fails_run() {
    let source = HttpBidSource::new(&SourceConfig {
        url: "http://127.0.0.1:9/grain".to_string(),
        timeout_secs: 2,
        ..SourceConfig::default()
    })
    .unwrap();
    let store = Arc::new(InMemoryStore::new());

    let run = coordinator(source, store.clone(), PipelineConfig::default())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.status.exit_code(), 1);
    assert_eq!(run.rows_appended, 0);
    assert_eq!(run.commodities_found, 0);
    assert_eq!(run.commodities_missing.len(), Commodity::ALL.len());
    assert!(!run.error_detail.unwrap_or_default().is_empty());
    assert!(store.is_empty().await);
    assert_eq!(store.runs().await.len(), 1);
}

#[tokio::test]
async fn test_unrecognised_page_fails_run() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"<html><body>Bids temporarily unavailable</body></html>")
        .unwrap();
    let store = Arc::new(InMemoryStore::new());

    let run = coordinator(
        FileBidSource::new(file.path(), rolla()),
        store.clone(),
        PipelineConfig::default(),
    )
    .run(&CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error_detail.unwrap().contains("layout"));
}

#[tokio::test]
async fn test_outlier_against_history_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    for day in 1..=5 {
        let at = Utc.with_ymd_and_hms(2026, 10, day, 14, 0, 0).unwrap();
        store
            .append(&PriceObservation::new(Commodity::Corn, dec!(4.10), at, "seed"))
            .await
            .unwrap();
    }

    let page = std::fs::read_to_string(FIXTURE)
        .unwrap()
        .replace("$4.12", "$412");
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
    let sheet = BidPageParser::new(rolla()).parse(&page, at).unwrap();

    let mut config = PipelineConfig::default();
    config
        .bounds
        .insert(Commodity::Corn, PriceBand::new(dec!(0), dec!(1000)));

    let run = coordinator(FrozenPage(sheet), store.clone(), config)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert!(run.commodities_missing.contains(&Commodity::Corn));
    let corn = store
        .query(&HistoryQuery::for_commodity(Commodity::Corn))
        .await
        .unwrap();
    assert_eq!(corn.len(), 5);
    assert!(corn.iter().all(|o| o.price == dec!(4.10)));
}
