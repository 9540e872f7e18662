//! Desk module - Position lifecycle, ledger, fees and order sizing

pub mod fees;
pub mod ledger;
pub mod lifecycle;
pub mod precision;

pub use fees::{FeeCalculator, FeeSchedule};
pub use ledger::{Ledger, LedgerSnapshot, Settlement};
pub use lifecycle::{CycleError, CyclePhase, CycleReport, DeskSettings, TradingDesk};
pub use precision::{ExchangeSymbolSpec, PrecisionResolver};
