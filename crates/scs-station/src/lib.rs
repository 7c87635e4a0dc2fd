//! Self-checkout station simulator runtime.
//!
//! This crate provides the pieces the `scs-station` binary is made of:
//! - `SystemEnv`: production `Environment` backed by OS randomness
//! - `attach_logging`: forwards every device notification to `tracing`
//! - `session`: scripted customer interactions
//!
//! ## Architecture
//!
//! ```text
//! scs-station
//!   ├─ StationError       (binary-level error)
//!   ├─ SystemEnv / SimEnv (randomness for fault injection)
//!   ├─ Station            (scs-core device arena)
//!   └─ Session            (cash, card, scale)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod logging;
pub mod session;
mod system_env;

pub use error::StationError;
pub use logging::{LogObserver, attach_logging};
use scs_core::{Currency, Environment, Station, StationConfig};
pub use session::{Session, SessionReport};
pub use system_env::SystemEnv;

/// Runtime options the binary collects from its command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Currency the station accepts.
    pub currency: Currency,
    /// Coin tray capacity.
    pub coin_tray_capacity: usize,
    /// Interaction to play.
    pub session: Session,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { currency: Currency::CAD, coin_tray_capacity: 20, session: Session::All }
    }
}

impl RuntimeConfig {
    /// Station construction parameters for these options.
    pub fn station_config(&self) -> StationConfig {
        StationConfig {
            currency: self.currency,
            coin_tray_capacity: self.coin_tray_capacity,
            ..StationConfig::default()
        }
    }
}

/// Build a logged station on `env`, seal it and play the configured session.
pub fn run<E: Environment>(env: E, config: &RuntimeConfig) -> Result<SessionReport, StationError> {
    let mut station = Station::new(env, config.station_config())
        .map_err(|e| StationError::Config(e.to_string()))?;
    attach_logging(&mut station)?;
    station.end_configuration();

    session::run(&mut station, config.session)
}
