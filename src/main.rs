//! Sitecheck main entry point
//!
//! This is the command-line interface for the sitecheck crawl and audit
//! engine.

use anyhow::{anyhow, Context as _};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sitecheck::config::{load_config_with_hash, Config};
use sitecheck::crawler::Orchestrator;
use sitecheck::issues::run_issue_engine;
use sitecheck::monitor::{run_monitor, sweep, StalePolicy};
use sitecheck::storage::{open_storage, SqliteStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Sitecheck: crawl a site and surface technical/SEO issues
#[derive(Parser, Debug)]
#[command(name = "sitecheck")]
#[command(version = "0.3.0")]
#[command(about = "Single-site crawler and issue auditor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a crawl from the configured seed URL
    Crawl,
    /// Re-run the issue pass over an existing crawl
    Audit {
        /// ID of the crawl to audit
        #[arg(value_name = "CRAWL_ID")]
        crawl_id: i64,
    },
    /// Run one stale-crawl sweep and exit
    SweepStale,
    /// Run the stale-crawl monitor until interrupted
    Monitor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => (cfg, hash),
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database at {}", config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    match cli.command {
        Command::Crawl => handle_crawl(config, config_hash, storage).await?,
        Command::Audit { crawl_id } => handle_audit(crawl_id, storage)?,
        Command::SweepStale => handle_sweep(&config, storage)?,
        Command::Monitor => handle_monitor(config, storage).await,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitecheck=info,warn"),
            1 => EnvFilter::new("sitecheck=debug,info"),
            2 => EnvFilter::new("sitecheck=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn handle_crawl(
    config: Config,
    config_hash: String,
    storage: Arc<Mutex<SqliteStorage>>,
) -> anyhow::Result<()> {
    let crawl_id = {
        let mut guard = storage.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        guard.create_crawl(&config.crawl.seed_url, &config_hash)?
    };

    let orchestrator = Orchestrator::new(config, storage);
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling crawl");
            cancel.cancel();
        }
    });

    let outcome = orchestrator.run(crawl_id).await?;
    println!(
        "crawl {} finished: {} ({} pages, {} issues)",
        outcome.crawl_id,
        outcome.status.to_db_string(),
        outcome.total_pages,
        outcome.issues
    );
    Ok(())
}

fn handle_audit(
    crawl_id: i64,
    storage: Arc<Mutex<SqliteStorage>>,
) -> anyhow::Result<()> {
    let seed_url = {
        let guard = storage.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        guard.get_crawl(crawl_id)?.seed_url
    };

    let issues = run_issue_engine(&storage, crawl_id, &seed_url)?;
    println!("crawl {crawl_id}: {issues} issues");
    Ok(())
}

async fn handle_monitor(config: Config, storage: Arc<Mutex<SqliteStorage>>) {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });
    run_monitor(storage, config.monitor, shutdown_rx).await;
}

fn handle_sweep(
    config: &Config,
    storage: Arc<Mutex<SqliteStorage>>,
) -> anyhow::Result<()> {
    let policy = StalePolicy::from_config(&config.monitor);
    let reaped = sweep(&storage, &policy)?;
    println!("stale sweep: {reaped} crawls failed");
    Ok(())
}
