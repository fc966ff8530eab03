//! History CLI command.
//!
//! Prints stored observations in ascending time order, as a table or CSV.

use anyhow::{anyhow, Context, Result};
use cashbid_core::{AppConfig, Commodity};
use cashbid_data::{CsvExport, HistoryQuery, PriceObservation, PriceStore};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;

use super::{connect, format_decimal};

/// Arguments for the history command.
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Commodity slug or label (e.g., "corn", "spring-wheat-14pro")
    #[arg(long)]
    pub commodity: Option<String>,

    /// Start of range, inclusive (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End of range, inclusive (RFC 3339 or YYYY-MM-DD, a date covers the whole day)
    #[arg(long)]
    pub to: Option<String>,

    /// Write CSV instead of a table
    #[arg(long)]
    pub csv: bool,

    /// CSV output file (stdout if not provided)
    #[arg(short, long, requires = "csv")]
    pub output: Option<String>,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Parses a range bound. Bare dates mean start of day for `from` and end of
/// day for `to`.
fn parse_bound(text: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{text}', expected RFC 3339 or YYYY-MM-DD"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| anyhow!("invalid time of day"))?;

    Ok(date.and_time(time).and_utc())
}

fn build_query(args: &HistoryArgs) -> Result<HistoryQuery> {
    let commodity = args
        .commodity
        .as_deref()
        .map(str::parse::<Commodity>)
        .transpose()
        .map_err(|e| anyhow!(e))?;
    let from = args.from.as_deref().map(|s| parse_bound(s, false)).transpose()?;
    let to = args.to.as_deref().map(|s| parse_bound(s, true)).transpose()?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(anyhow!("--from {} is after --to {}", from, to));
        }
    }

    Ok(HistoryQuery {
        commodity,
        from,
        to,
    })
}

/// Runs the history command.
///
/// # Errors
/// Returns an error if the arguments are invalid, the database is
/// unreachable, or output cannot be written.
pub async fn run_history(args: HistoryArgs, config: AppConfig) -> Result<()> {
    let query = build_query(&args)?;
    let store = connect(&config, args.db_url.clone()).await?.repositories();
    let rows = store.query(&query).await?;
    tracing::info!("Loaded {} observations", rows.len());

    if args.csv {
        match &args.output {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {path}"))?;
                CsvExport::write_observations(file, &rows)?;
                tracing::info!("Wrote {} rows to {}", rows.len(), path);
            }
            None => CsvExport::write_observations(std::io::stdout().lock(), &rows)?,
        }
    } else {
        print_history(&rows);
    }

    Ok(())
}

fn print_history(rows: &[PriceObservation]) {
    if rows.is_empty() {
        println!("No observations found");
        return;
    }

    println!(
        "{:<20} {:<22} {:>10} {:>10} {:>10}  {}",
        "Observed (UTC)", "Commodity", "Price", "Basis", "Change", "Delivery"
    );
    println!("{}", "-".repeat(90));
    for row in rows {
        println!(
            "{:<20} {:<22} {:>10} {:>10} {:>10}  {}",
            row.observed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.commodity.display_name(),
            row.price.to_string(),
            format_decimal(row.basis),
            format_decimal(row.futures_change),
            row.delivery.as_deref().unwrap_or("-")
        );
    }
    println!("{} rows", rows.len());
}
