//! Scrape CLI command.
//!
//! Runs one extraction cycle against the live page (or a saved snapshot),
//! records the run and exits with the run's status code.

use anyhow::Result;
use cashbid_core::AppConfig;
use cashbid_data::{InMemoryStore, PriceObservation, RunStatus};
use cashbid_ingest::{source_from_config, RunCoordinator};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{connect, format_decimal};

/// Arguments for the scrape command.
#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Parse a saved bid page instead of fetching the live one
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Keep observations in memory and print them; nothing is written to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Runs the scrape command.
///
/// # Errors
/// Returns an error if the source cannot be built, the database is
/// unreachable, or the run summary cannot be recorded. A failed run that was
/// recorded is not an error; it is reported through the returned status.
pub async fn run_scrape(args: ScrapeArgs, config: AppConfig) -> Result<RunStatus> {
    let mut source_config = config.source.clone();
    if let Some(path) = args.snapshot {
        source_config.snapshot_path = Some(path);
    }

    let source = source_from_config(&source_config)?;
    let timeout = Duration::from_secs(source_config.timeout_secs.max(1));
    tracing::info!("Scraping {} (timeout {}s)", source.describe(), timeout.as_secs());

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling extraction");
                cancel.cancel();
            }
        })
    };

    let run = if args.dry_run {
        let store = Arc::new(InMemoryStore::new());
        let coordinator = RunCoordinator::new(source, store.clone(), config.pipeline, timeout);
        let run = coordinator.run(&cancel).await;
        print_observations(&store.observations().await);
        run
    } else {
        let client = connect(&config, args.db_url).await?;
        client.ensure_schema().await?;
        let store = Arc::new(client.repositories());
        RunCoordinator::new(source, store, config.pipeline, timeout)
            .run(&cancel)
            .await
    };
    interrupt.abort();

    let run = run?;
    println!("{}", run.summary());
    Ok(run.status)
}

fn print_observations(rows: &[PriceObservation]) {
    if rows.is_empty() {
        println!("(dry run) no observations appended");
        return;
    }

    println!();
    println!(
        "{:<22} {:>10} {:>10} {:>10}  {}",
        "Commodity", "Price", "Basis", "Change", "Delivery"
    );
    println!("{}", "-".repeat(70));
    for row in rows {
        println!(
            "{:<22} {:>10} {:>10} {:>10}  {}",
            row.commodity.display_name(),
            row.price.to_string(),
            format_decimal(row.basis),
            format_decimal(row.futures_change),
            row.delivery.as_deref().unwrap_or("-")
        );
    }
    println!();
}
