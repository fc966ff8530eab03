//! Init-db CLI command.

use anyhow::Result;
use cashbid_core::AppConfig;
use clap::Args;

use super::connect;

/// Arguments for the init-db command.
#[derive(Args, Debug, Clone)]
pub struct InitDbArgs {
    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Creates the schema. Safe to run repeatedly.
///
/// # Errors
/// Returns an error if the database is unreachable or a statement fails.
pub async fn run_init_db(args: InitDbArgs, config: AppConfig) -> Result<()> {
    let client = connect(&config, args.db_url).await?;
    client.ensure_schema().await?;
    println!("Schema ready");
    Ok(())
}
