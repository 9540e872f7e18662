//! Capability seams consumed by the trading desk

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{Interval, JournalPhase, OrderFill, OrderSide, Position, SymbolMetadata};
use crate::desk::ledger::LedgerSnapshot;

/// Market data and order placement on a single exchange
///
/// Live and paper trading are two implementations of this trait; the desk's
/// ledger and position logic is identical for both. Calls are made one at a
/// time from within a cycle and are never retried by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Last traded price
    async fn current_price(&self, symbol: &str) -> Result<Decimal>;

    /// Exchange mark price used for minimum notional checks
    async fn mark_price(&self, symbol: &str) -> Result<Decimal>;

    /// Trading rules for every listed symbol
    async fn symbol_metadata(&self) -> Result<HashMap<String, SymbolMetadata>>;

    /// Closing prices of the last `steps` completed buckets, oldest first
    async fn closing_price_window(
        &self,
        symbol: &str,
        interval: Interval,
        steps: usize,
    ) -> Result<Vec<Decimal>>;

    /// Place a market order for `quantity`
    ///
    /// Implementations report whatever status the venue returns; deciding
    /// what a non-FILLED status means is left to the caller.
    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderFill>;

    /// Name used in logs
    fn venue_name(&self) -> &'static str;
}

/// Append-only sink for lifecycle records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionJournal: Send + Sync {
    /// Prepare the journal for a new trading session
    async fn initialize_session(
        &self,
        strategy_name: &str,
        initial_capital: Decimal,
        traded_symbols: &[String],
    ) -> Result<()>;

    /// Record the positions produced by one lifecycle phase
    async fn append_phase(
        &self,
        positions: &[Position],
        phase: JournalPhase,
        ledger: &LedgerSnapshot,
    ) -> Result<()>;
}

/// Boxed exchange client for dynamic dispatch
pub type BoxedExchange = Box<dyn ExchangeClient>;

/// Boxed journal for dynamic dispatch
pub type BoxedJournal = Box<dyn TransactionJournal>;
