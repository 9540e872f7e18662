//! TradingDesk Library
//!
//! A Rust library for running periodic long/short rebalancing cycles on
//! Binance USD-M futures with a fee-aware capital and collateral ledger.

pub mod binance;
pub mod common;
pub mod config;
pub mod desk;
pub mod exchange;
pub mod journal;
pub mod logging;
pub mod scheduler;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{DeskError, Result};
pub use common::traits::{BoxedExchange, BoxedJournal, ExchangeClient, TransactionJournal};
pub use common::types::{
    Interval, JournalPhase, OrderFill, OrderSide, OrderStatus, Position, PositionSide,
    SymbolMetadata, TimeUnit,
};
pub use config::types::AppConfig;
pub use binance::client::BinanceClient;
pub use binance::rest::BinanceRestClient;
pub use exchange::PaperExchange;
pub use journal::{CsvJournal, MemoryJournal};
pub use scheduler::{run_until_failure, CycleSchedule};

// Desk types
pub use desk::{
    CycleError, CyclePhase, CycleReport, DeskSettings, ExchangeSymbolSpec, FeeSchedule, Ledger,
    LedgerSnapshot, PrecisionResolver, TradingDesk,
};
pub use strategy::{signal_from_name, BoxedSignal, PriceWindow, SignalTargets, StrategySignal};
