use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use keno_lib::config::{self, Config};
use keno_lib::reports::{LogNotifier, Notifier, WebhookNotifier, send_report};
use keno_lib::store::open_store;
use keno_lib::utils::ingestion_time;
use keno_lib::{HttpFetcher, run_ingestion};

#[derive(Parser)]
#[command(name = "keno-ingest", about = "Collect Keno draw results into a local dataset")]
struct Cli {
    /// Store file to use instead of KENO_STORE_PATH
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the listing page once and append any new draws
    Ingest,
    /// Summarize the dataset and deliver the daily report
    Report,
}

async fn ingest(config: &Config, json: bool) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.source_url, &config.user_agent, config.fetch_timeout)?;
    let mut store = open_store(&config.store_path, config.store_backend);

    let report = run_ingestion(&fetcher, &mut *store).await.inspect_err(|e| {
        tracing::error!(category = e.category(), "ingestion run failed: {}", e);
    })?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "rows_seen={} rows_extracted={} rows_failed={} rows_added={} total_count={}",
            report.rows_seen, report.rows_extracted, report.rows_failed, report.rows_added, report.total_count
        );
    }
    Ok(())
}

async fn report(config: &Config, json: bool) -> Result<()> {
    let store = open_store(&config.store_path, config.store_backend);
    let notifier: Box<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url, config.notify_token.clone())),
        None => Box::new(LogNotifier),
    };

    if let Some(summary) = send_report(&*store, notifier.as_ref(), ingestion_time()).await? {
        if json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!("total_draws={} recent_draws={}", summary.total_draws, summary.recent_draws);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load()?;
    if let Some(path) = cli.store {
        config = config.with_store_path(path);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("🎲 Using {:?} store at {}", config.store_backend, config.store_path.display());

    match cli.command {
        Command::Ingest => ingest(&config, cli.json).await,
        Command::Report => report(&config, cli.json).await,
    }
}
