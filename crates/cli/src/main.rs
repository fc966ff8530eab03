use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;

use cashbid_core::config_loader::DEFAULT_CONFIG_PATH;
use cashbid_core::ConfigLoader;
use commands::{HistoryArgs, InitDbArgs, LatestArgs, RunsArgs, ScrapeArgs};

#[derive(Parser)]
#[command(name = "cashbid")]
#[command(about = "Scrape, store and inspect elevator cash bids", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction cycle and record it
    Scrape(ScrapeArgs),
    /// Print stored observations, optionally as CSV
    History(HistoryArgs),
    /// Print the latest observation of every commodity
    Latest(LatestArgs),
    /// Print recent run summaries
    Runs(RunsArgs),
    /// Create tables, indexes and the append-only trigger
    InitDb(InitDbArgs),
}

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ConfigLoader::load_from(&cli.config)?;

    match cli.command {
        Commands::Scrape(args) => {
            let status = commands::run_scrape(args, config).await?;
            // exit codes are 0, 1 or 2
            Ok(ExitCode::from(status.exit_code() as u8))
        }
        Commands::History(args) => {
            commands::run_history(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Latest(args) => {
            commands::run_latest(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Runs(args) => {
            commands::run_runs(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitDb(args) => {
            commands::run_init_db(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("Failed to open log file: {e:#}");
        return ExitCode::FAILURE;
    }

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
