//! Ratewatch - Lending-rate monitor
//!
//! Polls Morpho Blue borrow rates for enrolled vaults and sends Discord
//! webhook alerts when a rate moves further than a vault's threshold.

mod config;

use clap::Parser;
use ratewatch_alerts::AlertDispatcher;
use ratewatch_engine::{check_trigger, Monitor};
use ratewatch_morpho::MorphoClient;
use ratewatch_store::{JsonFileBackend, VaultStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Ratewatch CLI
#[derive(Parser, Debug)]
#[command(name = "ratewatch")]
#[command(about = "Lending-rate monitor with webhook alerts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Data directory for vault and rate state (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Check interval in minutes (overrides config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level: trace, debug, info, warn, error (overrides config)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Run a single check cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = match config::load(Path::new(&args.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(minutes) = args.interval {
        config.monitor.check_interval_minutes = minutes;
    }

    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level);
    info!("ratewatch starting");

    let backend = match JsonFileBackend::open(&config.storage.data_dir).await {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, dir = %config.storage.data_dir, "failed to prepare data directory");
            std::process::exit(1);
        }
    };
    let store = match VaultStore::open(backend).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "failed to load vault store");
            std::process::exit(1);
        }
    };
    info!(vaults = store.all_vaults().await.len(), "vault store loaded");

    let source = MorphoClient::new(
        config.morpho.api_url.clone(),
        config.morpho.page_size,
        config.morpho.chain_id,
    );
    let dispatcher = AlertDispatcher::new();
    let (trigger, trigger_rx) = check_trigger();

    let monitor = Monitor::new(
        Arc::clone(&store),
        source,
        dispatcher,
        config.monitor.interval(),
        trigger_rx,
    );

    if args.once {
        monitor.check_all().await;
        info!("single check complete");
        return;
    }

    // The front-end wiring hands this trigger to the command surface; keep it
    // alive here so the monitor loop does not see a closed channel.
    let _trigger = trigger;

    tokio::select! {
        _ = monitor.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("ratewatch stopped");
}
