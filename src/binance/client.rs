//! Binance client implementing the exchange capability used by the desk

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::messages::Kline;
use super::rest::BinanceRestClient;
use crate::common::errors::Result;
use crate::common::traits::ExchangeClient;
use crate::common::types::{Interval, OrderFill, OrderSide, SymbolMetadata};
use crate::config::types::BinanceConfig;

/// Live Binance USD-M futures client
pub struct BinanceClient {
    /// REST API client
    rest_client: BinanceRestClient,
}

impl BinanceClient {
    /// Create a new Binance client from configuration
    pub fn new(config: &BinanceConfig, timeout: Duration) -> Result<Self> {
        let rest_client =
            BinanceRestClient::with_timeout(&config.rest_url, timeout)?.recv_window(config.recv_window_ms);

        let rest_client = match config.credentials() {
            Some(creds) => rest_client.with_credentials(creds),
            None => rest_client,
        };

        Ok(Self { rest_client })
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &BinanceRestClient {
        &self.rest_client
    }

    /// Server clock minus local clock
    ///
    /// Signed requests are rejected once drift exceeds the recvWindow, so the
    /// binary logs this once at start-up.
    #[instrument(skip(self))]
    pub async fn clock_drift(&self) -> Result<ChronoDuration> {
        let local_before = Utc::now().timestamp_millis();
        let server = self.rest_client.get_server_time().await?;
        let local_after = Utc::now().timestamp_millis();

        let local_mid = local_before + (local_after - local_before) / 2;
        let drift = ChronoDuration::milliseconds(server - local_mid);
        info!(drift_ms = drift.num_milliseconds(), "Measured server clock drift");
        Ok(drift)
    }

    /// Closing prices of the `steps` completed buckets before the boundary at or before `now`
    pub async fn closing_prices_at(
        &self,
        symbol: &str,
        interval: Interval,
        steps: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Decimal>> {
        let (start, end) = interval.window(now, steps);
        let end_ms = end.timestamp_millis();

        let klines = self
            .rest_client
            .get_klines(
                symbol,
                &interval.code(),
                start.timestamp_millis(),
                end_ms - 1,
                steps + 1,
            )
            .await?;

        let closes = completed_closes(klines, end_ms, steps);
        debug!(symbol, count = closes.len(), %start, %end, "Fetched closing window");
        Ok(closes)
    }
}

/// Drop buckets opening at or after `end_ms` and keep the last `steps` closes
fn completed_closes(klines: Vec<Kline>, end_ms: i64, steps: usize) -> Vec<Decimal> {
    let closes: Vec<Decimal> = klines
        .into_iter()
        .filter(|k| k.open_time < end_ms)
        .map(|k| k.close)
        .collect();

    let skip = closes.len().saturating_sub(steps);
    closes.into_iter().skip(skip).collect()
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.rest_client.get_ticker_price(symbol).await
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal> {
        self.rest_client.get_mark_price(symbol).await
    }

    async fn symbol_metadata(&self) -> Result<HashMap<String, SymbolMetadata>> {
        let info = self.rest_client.get_exchange_info().await?;
        Ok(info
            .symbols
            .iter()
            .map(|s| (s.symbol.clone(), s.to_metadata()))
            .collect())
    }

    async fn closing_price_window(
        &self,
        symbol: &str,
        interval: Interval,
        steps: usize,
    ) -> Result<Vec<Decimal>> {
        self.closing_prices_at(symbol, interval, steps, Utc::now()).await
    }

    #[instrument(skip(self))]
    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        let response = self
            .rest_client
            .place_market_order(symbol, side, quantity)
            .await?;

        Ok(OrderFill {
            order_id: response.order_id,
            symbol: response.symbol,
            status: response.status,
            executed_qty: response.executed_qty,
            avg_price: response.avg_price,
            cum_quote: response.cum_quote,
        })
    }

    fn venue_name(&self) -> &'static str {
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kline(open_time: i64, close: Decimal) -> Kline {
        Kline {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ZERO,
            close_time: open_time + 999,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = BinanceClient::new(&BinanceConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
        assert!(!client.unwrap().rest().has_credentials());
    }

    #[test]
    fn test_completed_closes_drops_forming_bucket() {
        let klines = vec![
            kline(1000, dec!(1)),
            kline(2000, dec!(2)),
            kline(3000, dec!(3)),
            kline(4000, dec!(4)),
        ];
        assert_eq!(completed_closes(klines, 4000, 2), vec![dec!(2), dec!(3)]);
    }

    #[test]
    fn test_completed_closes_short_history() {
        let klines = vec![kline(1000, dec!(1))];
        assert_eq!(completed_closes(klines, 4000, 3), vec![dec!(1)]);
    }
}
