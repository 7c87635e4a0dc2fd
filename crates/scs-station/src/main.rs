//! Self-checkout station simulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Play every session with OS randomness
//! scs-station
//!
//! # Reproduce a run: same seed, same device events
//! scs-station --seed 42 --session cash --log-level debug
//! ```

use clap::Parser;
use scs_core::Currency;
use scs_harness::SimEnv;
use scs_station::{RuntimeConfig, Session, StationError, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Self-checkout station simulator
#[derive(Parser, Debug)]
#[command(name = "scs-station")]
#[command(about = "Simulates the peripherals of a self-checkout station")]
#[command(version)]
struct Args {
    /// Seed for fault injection (omit to use OS randomness)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Accepted currency (ISO 4217 code)
    #[arg(short, long, default_value = "CAD")]
    currency: String,

    /// Coin tray capacity
    #[arg(long, default_value = "20")]
    coin_tray_capacity: usize,

    /// Session to play
    #[arg(long, value_enum, default_value = "all")]
    session: Session,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let currency: Currency =
        args.currency.parse().map_err(|e| StationError::Config(format!("{e}")))?;
    let config = RuntimeConfig {
        currency,
        coin_tray_capacity: args.coin_tray_capacity,
        session: args.session,
    };

    tracing::info!(?config, seed = ?args.seed, "self-checkout station starting");

    let report = match args.seed {
        Some(seed) => scs_station::run(SimEnv::with_seed(seed), &config)?,
        None => scs_station::run(SystemEnv::new(), &config)?,
    };

    tracing::info!(
        paid = report.paid_minor,
        change = report.change_minor,
        card_reads = report.card_reads,
        grams = report.weighed_grams,
        "station shutting down"
    );

    Ok(())
}
