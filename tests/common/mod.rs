//! Common test utilities and fixtures

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use trading_desk::common::errors::{DeskError, Result};
use trading_desk::common::traits::ExchangeClient;
use trading_desk::common::types::{
    Interval, LotSize, OrderFill, OrderSide, OrderStatus, SymbolMetadata, TimeUnit,
};
use trading_desk::desk::{DeskSettings, FeeSchedule};

/// Lot rules used by most scenarios: step 0.01, minQty 0.01, minNotional 10
pub static STANDARD_LOT: Lazy<SymbolRules> = Lazy::new(|| SymbolRules {
    quantity_precision: 2,
    step_size: dec!(0.01),
    min_qty: dec!(0.01),
    min_notional: dec!(10),
});

/// Closing window that ranks highest under momentum1
pub static RISING: Lazy<Vec<Decimal>> = Lazy::new(|| ramp(dec!(100), dec!(2)));

/// Closing window that ranks lowest under momentum1
pub static FALLING: Lazy<Vec<Decimal>> = Lazy::new(|| ramp(dec!(100), dec!(-2)));

/// Closing window with zero momentum
pub static SIDEWAYS: Lazy<Vec<Decimal>> = Lazy::new(|| vec![dec!(100); 13]);

fn ramp(start: Decimal, step: Decimal) -> Vec<Decimal> {
    (0..13).map(|i| start + step * Decimal::from(i)).collect()
}

/// Lot rules of one scripted symbol
#[derive(Debug, Clone, Copy)]
pub struct SymbolRules {
    pub quantity_precision: u32,
    pub step_size: Decimal,
    pub min_qty: Decimal,
    pub min_notional: Decimal,
}

/// One order the desk sent
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

#[derive(Default)]
struct ScriptState {
    prices: HashMap<String, Decimal>,
    rules: HashMap<String, SymbolRules>,
    windows: HashMap<String, Vec<Decimal>>,
    halted: HashSet<String>,
    without_lot_size: HashSet<String>,
    statuses: VecDeque<OrderStatus>,
    orders: Vec<PlacedOrder>,
    next_order_id: i64,
}

/// In-process exchange with scripted prices, rules and order outcomes
///
/// Clones share state, so a test can keep a handle after boxing one copy
/// into the desk.
#[derive(Clone, Default)]
pub struct ScriptedExchange {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol with its price, lot rules and closing window
    pub fn with_symbol(self, symbol: &str, price: Decimal, rules: SymbolRules, closes: &[Decimal]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.prices.insert(symbol.to_string(), price);
            state.rules.insert(symbol.to_string(), rules);
            state.windows.insert(symbol.to_string(), closes.to_vec());
        }
        self
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.state.lock().unwrap().prices.insert(symbol.to_string(), price);
    }

    pub fn set_window(&self, symbol: &str, closes: &[Decimal]) {
        self.state
            .lock()
            .unwrap()
            .windows
            .insert(symbol.to_string(), closes.to_vec());
    }

    /// Report the symbol as not trading in exchange metadata
    pub fn halt(&self, symbol: &str) {
        self.state.lock().unwrap().halted.insert(symbol.to_string());
    }

    /// Drop the symbol's market lot size filter from exchange metadata
    pub fn remove_market_lot_size(&self, symbol: &str) {
        self.state
            .lock()
            .unwrap()
            .without_lot_size
            .insert(symbol.to_string());
    }

    /// Statuses returned by the next orders, in order; afterwards orders fill
    pub fn script_statuses(&self, statuses: &[OrderStatus]) {
        self.state.lock().unwrap().statuses.extend(statuses.iter().copied());
    }

    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn orders_for(&self, symbol: &str) -> Vec<PlacedOrder> {
        self.orders().into_iter().filter(|o| o.symbol == symbol).collect()
    }

    fn price_of(&self, symbol: &str) -> Result<Decimal> {
        self.state
            .lock()
            .unwrap()
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| DeskError::UnknownSymbol(symbol.to_string()))
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.price_of(symbol)
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal> {
        self.price_of(symbol)
    }

    async fn symbol_metadata(&self) -> Result<HashMap<String, SymbolMetadata>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .iter()
            .map(|(symbol, rules)| {
                (
                    symbol.clone(),
                    SymbolMetadata {
                        symbol: symbol.clone(),
                        quantity_precision: rules.quantity_precision,
                        tradable: !state.halted.contains(symbol),
                        market_lot_size: if state.without_lot_size.contains(symbol) {
                            None
                        } else {
                            Some(LotSize {
                                min_qty: rules.min_qty,
                                step_size: rules.step_size,
                            })
                        },
                        min_notional: Some(rules.min_notional),
                    },
                )
            })
            .collect())
    }

    async fn closing_price_window(
        &self,
        symbol: &str,
        _interval: Interval,
        steps: usize,
    ) -> Result<Vec<Decimal>> {
        let state = self.state.lock().unwrap();
        let closes = state
            .windows
            .get(symbol)
            .ok_or_else(|| DeskError::UnknownSymbol(symbol.to_string()))?;
        let skip = closes.len().saturating_sub(steps);
        Ok(closes[skip..].to_vec())
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        let price = self.price_of(symbol)?;
        let mut state = self.state.lock().unwrap();
        state.next_order_id += 1;
        state.orders.push(PlacedOrder {
            symbol: symbol.to_string(),
            side,
            quantity,
        });
        let status = state.statuses.pop_front().unwrap_or(OrderStatus::Filled);
        let filled = status == OrderStatus::Filled;

        Ok(OrderFill {
            order_id: state.next_order_id,
            symbol: symbol.to_string(),
            status,
            executed_qty: if filled { quantity } else { Decimal::ZERO },
            avg_price: if filled { price } else { Decimal::ZERO },
            cum_quote: if filled { price * quantity } else { Decimal::ZERO },
        })
    }

    fn venue_name(&self) -> &'static str {
        "Scripted"
    }
}

/// Desk settings for a momentum1 session at 1000 capital and 5bps fees
pub fn desk_settings(symbols: &[&str], buy: usize, sell: usize) -> DeskSettings {
    DeskSettings {
        strategy_name: "momentum1".to_string(),
        traded_symbols: symbols.iter().map(|s| s.to_string()).collect(),
        interval: Interval::new(TimeUnit::Hour, 4),
        buy_count: buy,
        sell_count: sell,
        initial_capital: dec!(1000),
        fees: FeeSchedule::binance_futures(),
        signal_delay: Duration::ZERO,
    }
}
