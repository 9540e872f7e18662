//! Position lifecycle: close, signal, open
//!
//! One [`TradingDesk::run_cycle`] call closes everything the previous cycle
//! opened, asks the strategy for new targets, sizes them against the
//! exchange's lot rules and opens them. The ledger and the held set are owned
//! here and nowhere else.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::fees::{FeeCalculator, FeeSchedule};
use super::ledger::{Ledger, LedgerSnapshot, Settlement};
use super::precision::PrecisionResolver;
use crate::common::errors::{DeskError, Result};
use crate::common::traits::{BoxedExchange, BoxedJournal};
use crate::common::types::{Interval, JournalPhase, OrderFill, OrderStatus, Position, PositionSide};
use crate::config::types::AppConfig;
use crate::strategy::{signal_from_name, BoxedSignal, PriceWindow, SignalTargets};

/// Session parameters the desk needs after start-up
#[derive(Debug, Clone, PartialEq)]
pub struct DeskSettings {
    pub strategy_name: String,
    /// Traded symbols in journal order
    pub traded_symbols: Vec<String>,
    pub interval: Interval,
    pub buy_count: usize,
    pub sell_count: usize,
    pub initial_capital: Decimal,
    pub fees: FeeSchedule,
    /// Pause between the close and signal phases
    pub signal_delay: Duration,
}

impl DeskSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            strategy_name: config.strategy.strategy_name.clone(),
            traded_symbols: config.session.traded_assets.clone(),
            interval: config.strategy.interval(),
            buy_count: config.strategy.n_asset_buy,
            sell_count: config.strategy.n_asset_sell,
            initial_capital: config.session.init_capital,
            fees: FeeSchedule::new(config.session.fee_rate)?,
            signal_delay: Duration::from_secs(config.settings.signal_delay_seconds),
        })
    }

    fn selected_count(&self) -> usize {
        self.buy_count + self.sell_count
    }
}

/// Phase of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Close,
    Signal,
    Open,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePhase::Close => write!(f, "close"),
            CyclePhase::Signal => write!(f, "signal"),
            CyclePhase::Open => write!(f, "open"),
        }
    }
}

/// A cycle aborted part way through
///
/// `stranded` holds positions whose trades were settled in the aborted phase
/// before it failed; they exist on the exchange and in the ledger but in no
/// held set.
#[derive(Debug, Error)]
#[error("cycle aborted in {phase} phase: {source}")]
pub struct CycleError {
    pub phase: CyclePhase,
    #[source]
    pub source: DeskError,
    pub stranded: Vec<Position>,
}

impl CycleError {
    fn new(phase: CyclePhase, source: DeskError, stranded: Vec<Position>) -> Self {
        Self {
            phase,
            source,
            stranded,
        }
    }
}

/// Outcome of a completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Cleared positions, empty when nothing was held
    pub closed: Vec<Position>,
    /// New held set, one entry per traded symbol
    pub opened: Vec<Position>,
    pub ledger: LedgerSnapshot,
}

impl CycleReport {
    /// Symbols that were sized below the exchange minimum
    pub fn rejected(&self) -> impl Iterator<Item = &Position> {
        self.opened.iter().filter(|p| p.is_rejected())
    }
}

/// Position lifecycle manager
pub struct TradingDesk {
    settings: DeskSettings,
    exchange: BoxedExchange,
    journal: BoxedJournal,
    signal: BoxedSignal,
    ledger: Ledger,
    held: Vec<Position>,
    cycle: u64,
}

impl TradingDesk {
    /// Create a desk running the strategy named in `settings`
    pub fn new(settings: DeskSettings, exchange: BoxedExchange, journal: BoxedJournal) -> Result<Self> {
        let signal = signal_from_name(&settings.strategy_name)?;
        Self::with_signal(settings, exchange, journal, signal)
    }

    /// Create a desk with an explicit strategy
    pub fn with_signal(
        settings: DeskSettings,
        exchange: BoxedExchange,
        journal: BoxedJournal,
        signal: BoxedSignal,
    ) -> Result<Self> {
        if settings.selected_count() == 0 {
            return Err(DeskError::Configuration(
                "at least one long or short target is required".to_string(),
            ));
        }
        if settings.selected_count() > settings.traded_symbols.len() {
            return Err(DeskError::Configuration(format!(
                "{} targets requested from {} traded symbols",
                settings.selected_count(),
                settings.traded_symbols.len()
            )));
        }
        if signal.window_len() == 0 {
            return Err(DeskError::Configuration(format!(
                "strategy {} requests an empty price window",
                signal.name()
            )));
        }

        Ok(Self {
            ledger: Ledger::new(settings.initial_capital),
            settings,
            exchange,
            journal,
            signal,
            held: Vec::new(),
            cycle: 0,
        })
    }

    /// Write the session header to the journal
    pub async fn initialize(&self) -> Result<()> {
        info!(
            strategy = self.signal.name(),
            venue = self.exchange.venue_name(),
            capital = %self.settings.initial_capital,
            symbols = ?self.settings.traded_symbols,
            "Initializing trading session"
        );
        self.journal
            .initialize_session(
                self.signal.name(),
                self.settings.initial_capital,
                &self.settings.traded_symbols,
            )
            .await
    }

    pub fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn held(&self) -> &[Position] {
        &self.held
    }

    /// Number of cycles started so far
    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }

    /// Run one full close, signal, open cycle
    ///
    /// Any failure aborts the rest of the cycle. Nothing is retried.
    #[instrument(skip(self), fields(cycle = self.cycle + 1))]
    pub async fn run_cycle(&mut self) -> std::result::Result<CycleReport, CycleError> {
        self.cycle += 1;
        info!(capital = %self.ledger.capital(), held = self.held.len(), "Starting cycle");

        match self.run_phases().await {
            Ok(report) => {
                info!(
                    capital = %report.ledger.capital,
                    collateral_long = %report.ledger.collateral_long,
                    collateral_short = %report.ledger.collateral_short,
                    rejected = report.rejected().count(),
                    "Cycle complete"
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    phase = %err.phase,
                    error = %err.source,
                    transport = err.source.is_transport(),
                    stranded = ?err.stranded,
                    ledger = ?self.ledger.snapshot(),
                    "Cycle aborted"
                );
                Err(err)
            }
        }
    }

    async fn run_phases(&mut self) -> std::result::Result<CycleReport, CycleError> {
        let closed = self.close_phase().await?;

        if !self.settings.signal_delay.is_zero() {
            tokio::time::sleep(self.settings.signal_delay).await;
        }

        let targets = self
            .signal_phase()
            .await
            .map_err(|e| CycleError::new(CyclePhase::Signal, e, Vec::new()))?;

        let opened = self.open_phase(&targets).await?;

        Ok(CycleReport {
            cycle: self.cycle,
            closed,
            opened,
            ledger: self.ledger.snapshot(),
        })
    }

    // ========================================================================
    // Close
    // ========================================================================

    async fn close_phase(&mut self) -> std::result::Result<Vec<Position>, CycleError> {
        if self.held.is_empty() {
            info!("No held positions to close");
            return Ok(Vec::new());
        }

        let held = std::mem::take(&mut self.held);
        let mut cleared = Vec::with_capacity(held.len());

        for (idx, position) in held.iter().enumerate() {
            if !position.is_open() {
                cleared.push(Position::flat(&position.symbol));
                continue;
            }

            match self.close_position(position).await {
                Ok(closed) => cleared.push(closed),
                Err(e) => {
                    // Keep whatever is still on the exchange so it stays visible
                    self.held = held[idx..].to_vec();
                    return Err(CycleError::new(CyclePhase::Close, e, stranded(cleared)));
                }
            }
        }

        let snapshot = self.ledger.snapshot();
        if let Err(e) = self
            .journal
            .append_phase(&cleared, JournalPhase::Close, &snapshot)
            .await
        {
            return Err(CycleError::new(CyclePhase::Close, e, stranded(cleared)));
        }
        Ok(cleared)
    }

    async fn close_position(&mut self, position: &Position) -> Result<Position> {
        let price = self.exchange.current_price(&position.symbol).await?;
        let offset = position.side.offset();
        let order_side = offset.order_side().ok_or_else(|| {
            DeskError::InvalidResponse(format!("no order side closes {}", position.symbol))
        })?;

        let fill = self
            .exchange
            .place_market_order(&position.symbol, order_side, position.quantity)
            .await?;
        ensure_filled(&fill)?;

        let exec_price = execution_price(&fill, price);
        let quantity = executed_quantity(&fill, position.quantity);
        let amount = self.ledger.settle(
            Settlement::Close {
                held_side: position.side,
                held_amount: position.notional_amount,
            },
            offset,
            exec_price,
            quantity,
            self.settings.fees.taker_fee_rate,
        );

        let fee = FeeCalculator::fee_paid(offset, exec_price, quantity, self.settings.fees.taker_fee_rate);
        info!(
            symbol = %position.symbol,
            side = %offset,
            %quantity,
            price = %exec_price,
            %amount,
            %fee,
            "Closed position"
        );

        Ok(Position {
            symbol: position.symbol.clone(),
            side: offset,
            fetched_price: price,
            entry_price: exec_price,
            quantity,
            notional_amount: amount,
        })
    }

    // ========================================================================
    // Signal
    // ========================================================================

    async fn signal_phase(&self) -> Result<SignalTargets> {
        let steps = self.signal.window_len();
        let mut window = PriceWindow::new();

        for symbol in &self.settings.traded_symbols {
            let closes = self
                .exchange
                .closing_price_window(symbol, self.settings.interval, steps)
                .await?;
            window.insert(symbol.clone(), closes);
        }
        window.ensure_steps(steps)?;

        let targets =
            self.signal
                .compute_targets(&window, self.settings.buy_count, self.settings.sell_count)?;
        targets.validate(
            self.settings.buy_count,
            self.settings.sell_count,
            &self.settings.traded_symbols,
        )?;

        info!(long = ?targets.long, short = ?targets.short, "Computed targets");
        Ok(targets)
    }

    // ========================================================================
    // Open
    // ========================================================================

    async fn open_phase(
        &mut self,
        targets: &SignalTargets,
    ) -> std::result::Result<Vec<Position>, CycleError> {
        let per_asset = self.ledger.capital() / Decimal::from(self.settings.selected_count());
        let symbols = self.settings.traded_symbols.clone();
        let mut next = Vec::with_capacity(symbols.len());
        let mut settled = Vec::new();

        for symbol in &symbols {
            let side = targets.side_for(symbol);
            if side == PositionSide::Flat {
                next.push(Position::flat(symbol));
                continue;
            }

            match self.open_position(symbol, side, per_asset).await {
                Ok(position) => {
                    if position.is_open() {
                        settled.push(position.clone());
                    }
                    next.push(position);
                }
                Err(e) => return Err(CycleError::new(CyclePhase::Open, e, settled)),
            }
        }

        self.held = next.clone();

        let snapshot = self.ledger.snapshot();
        self.journal
            .append_phase(&self.held, JournalPhase::Open, &snapshot)
            .await
            .map_err(|e| CycleError::new(CyclePhase::Open, e, Vec::new()))?;
        Ok(next)
    }

    async fn open_position(
        &mut self,
        symbol: &str,
        side: PositionSide,
        per_asset: Decimal,
    ) -> Result<Position> {
        let price = self.exchange.current_price(symbol).await?;
        if price <= Decimal::ZERO {
            return Err(DeskError::InvalidResponse(format!(
                "non-positive price {} for {}",
                price, symbol
            )));
        }

        let spec = PrecisionResolver::new(self.exchange.as_ref())
            .resolve(symbol)
            .await?;
        let target = spec.round_quantity(per_asset / price);
        let minimum = spec.min_order_quantity();

        if target <= Decimal::ZERO || target < minimum {
            warn!(
                symbol,
                %side,
                %target,
                %minimum,
                %price,
                "Target below minimum order quantity, skipping"
            );
            return Ok(Position::rejected(symbol, side, price));
        }

        let order_side = side.order_side().ok_or_else(|| {
            DeskError::InvalidResponse(format!("no order side opens {} for {}", side, symbol))
        })?;
        let fill = self
            .exchange
            .place_market_order(symbol, order_side, target)
            .await?;
        ensure_filled(&fill)?;

        let exec_price = execution_price(&fill, price);
        let quantity = executed_quantity(&fill, target);
        let amount = self.ledger.settle(
            Settlement::Open,
            side,
            exec_price,
            quantity,
            self.settings.fees.taker_fee_rate,
        );

        let fee = FeeCalculator::fee_paid(side, exec_price, quantity, self.settings.fees.taker_fee_rate);
        info!(
            symbol,
            %side,
            %quantity,
            price = %exec_price,
            %amount,
            %fee,
            "Opened position"
        );

        Ok(Position {
            symbol: symbol.to_string(),
            side,
            fetched_price: price,
            entry_price: exec_price,
            quantity,
            notional_amount: amount,
        })
    }
}

/// Cleared positions that actually traded before a close-phase failure
fn stranded(cleared: Vec<Position>) -> Vec<Position> {
    cleared
        .into_iter()
        .filter(|p| p.side != PositionSide::Flat)
        .collect()
}

fn ensure_filled(fill: &OrderFill) -> Result<()> {
    if fill.status == OrderStatus::Filled {
        return Ok(());
    }
    Err(DeskError::OrderNotFilled {
        symbol: fill.symbol.clone(),
        order_id: fill.order_id,
        status: fill.status.to_string(),
    })
}

/// Average fill price, or the price observed before ordering when the venue reports none
fn execution_price(fill: &OrderFill, fetched: Decimal) -> Decimal {
    if fill.avg_price > Decimal::ZERO {
        fill.avg_price
    } else {
        fetched
    }
}

fn executed_quantity(fill: &OrderFill, requested: Decimal) -> Decimal {
    if fill.executed_qty > Decimal::ZERO {
        fill.executed_qty
    } else {
        requested
    }
}
