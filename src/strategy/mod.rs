//! Strategy module for target selection
//!
//! This module defines the signal contract the trading desk consumes and the
//! registry that maps a configured strategy name to an implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SIGNAL PHASE (per cycle)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TradingDesk                                                │
//! │    - fetches window_len() aligned closes per traded symbol  │
//! │    - assembles a PriceWindow                                │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StrategySignal.compute_targets() → SignalTargets           │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  SignalTargets.validate() → long / short / implicit flat    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`StrategySignal`]: Trait for implementing signals
//! - [`PriceWindow`]: Symbol-indexed closing price table
//! - [`SignalTargets`]: Long and short symbol sets
//! - [`Momentum`]: Cross-sectional momentum (`momentum1`)

mod momentum;
mod traits;
mod types;

pub use momentum::{Momentum, RankedSymbol, DEFAULT_LOOKBACK, MOMENTUM1};
pub use traits::{BoxedSignal, StrategySignal};
pub use types::{PriceWindow, SignalTargets};

use crate::common::errors::{DeskError, Result};

/// Names accepted by [`signal_from_name`]
pub const REGISTERED_STRATEGIES: &[&str] = &[MOMENTUM1];

/// Build the strategy registered under `name`
pub fn signal_from_name(name: &str) -> Result<BoxedSignal> {
    match name {
        MOMENTUM1 => Ok(Box::new(Momentum::default())),
        other => Err(DeskError::Configuration(format!(
            "unknown strategy '{}', expected one of {:?}",
            other, REGISTERED_STRATEGIES
        ))),
    }
}
