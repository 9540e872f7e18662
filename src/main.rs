//! TradingDesk - Main Entry Point
//!
//! Loads a session configuration, connects to Binance USD-M futures and runs
//! rebalancing cycles on the strategy's schedule until one fails.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use trading_desk::binance::BinanceClient;
use trading_desk::common::traits::BoxedExchange;
use trading_desk::config::load_config;
use trading_desk::desk::{DeskSettings, TradingDesk};
use trading_desk::exchange::PaperExchange;
use trading_desk::journal::CsvJournal;
use trading_desk::logging::init_logging;
use trading_desk::scheduler::{run_until_failure, CycleSchedule};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "TRADING_DESK_CONFIG")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides settings.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run a single cycle immediately and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(args.config.as_str()))
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let _log_guard = init_logging(
        &level,
        args.json_logs,
        &config.settings.log_dir,
        &config.strategy.strategy_name,
    )?;

    info!("Starting TradingDesk application");
    info!("Configuration file: {}", args.config);
    info!("Effective configuration:\n{}", config.config_table());

    let timeout = Duration::from_secs(config.settings.request_timeout_seconds);
    let binance = BinanceClient::new(&config.binance, timeout)?;
    if let Err(e) = binance.clock_drift().await {
        warn!(error = %e, "Could not measure server clock drift");
    }

    let exchange: BoxedExchange = if config.session.is_mock {
        Box::new(PaperExchange::new(Box::new(binance)))
    } else {
        Box::new(binance)
    };

    let journal = CsvJournal::create(&config.settings.journal_dir, &config.session.session_name)?;
    info!("Journal file: {}", journal.path().display());

    let settings = DeskSettings::from_config(&config)?;
    let schedule = CycleSchedule::new(settings.interval);
    let mut desk = TradingDesk::new(settings, exchange, Box::new(journal))?;
    desk.initialize().await?;

    info!("Application initialized successfully");

    if args.once {
        let report = desk.run_cycle().await?;
        info!(
            cycle = report.cycle,
            capital = %report.ledger.capital,
            "Single cycle finished"
        );
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    match run_until_failure(&mut desk, schedule, shutdown).await {
        Ok(completed) => {
            info!(completed, "Received shutdown signal, cleaning up...");
            Ok(())
        }
        Err(err) => {
            error!(phase = %err.phase, stranded = err.stranded.len(), "Trading stopped");
            Err(err.into())
        }
    }
}
