//! Runs CLI command: recent scrape run summaries, newest first.

use anyhow::Result;
use cashbid_core::AppConfig;
use cashbid_data::{RunLog, ScrapeRun};
use clap::Args;

use super::connect;

/// Arguments for the runs command.
#[derive(Args, Debug, Clone)]
pub struct RunsArgs {
    /// Number of runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: u32,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Runs the runs command.
///
/// # Errors
/// Returns an error if the database is unreachable or a row is corrupt.
pub async fn run_runs(args: RunsArgs, config: AppConfig) -> Result<()> {
    let store = connect(&config, args.db_url).await?.repositories();
    let runs = store.recent_runs(args.limit).await?;
    print_runs(&runs);
    Ok(())
}

fn print_runs(runs: &[ScrapeRun]) {
    if runs.is_empty() {
        println!("No runs recorded yet");
        return;
    }

    println!(
        "{:<20} {:<8} {:>6} {:>9}  {}",
        "Started (UTC)", "Status", "Found", "Appended", "Missing / error"
    );
    println!("{}", "-".repeat(90));
    for run in runs {
        let mut notes: Vec<String> = run
            .commodities_missing
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        if let Some(detail) = &run.error_detail {
            notes.push(detail.clone());
        }

        println!(
            "{:<20} {:<8} {:>6} {:>9}  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            run.status.as_str(),
            run.commodities_found,
            run.rows_appended,
            notes.join(", ")
        );
    }
}
