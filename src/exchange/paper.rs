//! Paper execution with simulated fills
//!
//! `PaperExchange` forwards every market-data query to a wrapped client and
//! answers market orders locally. Every order fills in full, immediately, at
//! the current price of the wrapped venue.
//!
//! Limitations:
//! - no slippage or market impact
//! - no partial fills

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::common::errors::{DeskError, Result};
use crate::common::traits::{BoxedExchange, ExchangeClient};
use crate::common::types::{Interval, OrderFill, OrderSide, OrderStatus, SymbolMetadata};

/// Exchange wrapper that simulates order placement
pub struct PaperExchange {
    inner: BoxedExchange,
    next_order_id: AtomicI64,
    fills: RwLock<Vec<(OrderSide, OrderFill)>>,
}

impl PaperExchange {
    pub fn new(inner: BoxedExchange) -> Self {
        info!(venue = inner.venue_name(), "Paper execution enabled");
        Self {
            inner,
            next_order_id: AtomicI64::new(1),
            fills: RwLock::new(Vec::new()),
        }
    }

    /// Simulated fills so far, oldest first
    pub async fn fills(&self) -> Vec<(OrderSide, OrderFill)> {
        self.fills.read().await.clone()
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.inner.current_price(symbol).await
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal> {
        self.inner.mark_price(symbol).await
    }

    async fn symbol_metadata(&self) -> Result<HashMap<String, SymbolMetadata>> {
        self.inner.symbol_metadata().await
    }

    async fn closing_price_window(
        &self,
        symbol: &str,
        interval: Interval,
        steps: usize,
    ) -> Result<Vec<Decimal>> {
        self.inner.closing_price_window(symbol, interval, steps).await
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        if quantity <= Decimal::ZERO {
            return Err(DeskError::InvalidResponse(format!(
                "paper order for {} with non-positive quantity {}",
                symbol, quantity
            )));
        }

        let price = self.inner.current_price(symbol).await?;
        let fill = OrderFill {
            order_id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            symbol: symbol.to_string(),
            status: OrderStatus::Filled,
            executed_qty: quantity,
            avg_price: price,
            cum_quote: price * quantity,
        };
        debug!(
            order_id = fill.order_id,
            symbol,
            %side,
            %quantity,
            %price,
            "Simulated market fill"
        );

        self.fills.write().await.push((side, fill.clone()));
        Ok(fill)
    }

    fn venue_name(&self) -> &'static str {
        "Paper"
    }
}
