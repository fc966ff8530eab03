//! Latest CLI command: the most recent observation of every stored commodity.

use anyhow::Result;
use cashbid_core::AppConfig;
use cashbid_data::{PriceObservation, PriceStore};
use chrono::{DateTime, Utc};
use clap::Args;

use super::{connect, format_decimal};

/// Arguments for the latest command.
#[derive(Args, Debug, Clone)]
pub struct LatestArgs {
    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Runs the latest command.
///
/// # Errors
/// Returns an error if the database is unreachable or a row is corrupt.
pub async fn run_latest(args: LatestArgs, config: AppConfig) -> Result<()> {
    let store = connect(&config, args.db_url).await?.repositories();
    let rows = store.latest_all().await?;
    print_latest(&rows, Utc::now());
    Ok(())
}

fn age(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - observed_at).num_minutes().max(0);
    match minutes {
        0..=59 => format!("{minutes}m"),
        60..=2879 => format!("{}h", minutes / 60),
        _ => format!("{}d", minutes / 1440),
    }
}

fn print_latest(rows: &[PriceObservation], now: DateTime<Utc>) {
    if rows.is_empty() {
        println!("No observations stored yet");
        return;
    }

    println!(
        "{:<22} {:>10} {:>10} {:>10}  {:<20} {:>6}",
        "Commodity", "Price", "Basis", "Change", "Observed (UTC)", "Age"
    );
    println!("{}", "-".repeat(85));
    for row in rows {
        println!(
            "{:<22} {:>10} {:>10} {:>10}  {:<20} {:>6}",
            row.commodity.display_name(),
            row.price.to_string(),
            format_decimal(row.basis),
            format_decimal(row.futures_change),
            row.observed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            age(row.observed_at, now)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_age_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
        assert_eq!(age(now - Duration::minutes(5), now), "5m");
        assert_eq!(age(now - Duration::hours(3), now), "3h");
        assert_eq!(age(now - Duration::days(4), now), "4d");
        // clock skew never shows a negative age
        assert_eq!(age(now + Duration::minutes(2), now), "0m");
    }
}
