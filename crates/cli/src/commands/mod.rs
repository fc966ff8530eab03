//! CLI commands for the cash bid pipeline.

pub mod history;
pub mod init_db;
pub mod latest;
pub mod runs;
pub mod scrape;

pub use history::{run_history, HistoryArgs};
pub use init_db::{run_init_db, InitDbArgs};
pub use latest::{run_latest, LatestArgs};
pub use runs::{run_runs, RunsArgs};
pub use scrape::{run_scrape, ScrapeArgs};

use anyhow::Result;
use cashbid_core::{AppConfig, DatabaseConfig};
use cashbid_data::DatabaseClient;
use rust_decimal::Decimal;

/// Database settings with `--db-url` / `DATABASE_URL` taking precedence over the config file.
fn database_config(config: &AppConfig, db_url: Option<String>) -> DatabaseConfig {
    match db_url {
        Some(url) => DatabaseConfig {
            url,
            ..config.database.clone()
        },
        None => config.database.clone(),
    }
}

async fn connect(config: &AppConfig, db_url: Option<String>) -> Result<DatabaseClient> {
    let db = database_config(config, db_url);
    let client = DatabaseClient::connect(&db).await?;
    tracing::info!("Connected to database");
    Ok(client)
}

fn format_decimal(value: Option<Decimal>) -> String {
    value
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string())
}
