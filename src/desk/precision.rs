use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument};

use crate::common::errors::{DeskError, Result};
use crate::common::traits::ExchangeClient;

/// Trading rules of one symbol at one moment
///
/// Built from live metadata and a live mark price; never reused across cycles
/// because tradability and mark price move.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeSymbolSpec {
    pub symbol: String,
    pub quantity_precision: u32,
    pub step_size: Decimal,
    pub min_quantity: Decimal,
    pub min_notional: Decimal,
    pub mark_price: Decimal,
}

impl ExchangeSymbolSpec {
    /// Smallest quantity passing both the lot size and the notional filter
    pub fn min_order_quantity(&self) -> Decimal {
        min_order_quantity(self.min_quantity, self.min_notional, self.mark_price, self.step_size)
    }

    /// Round a raw target quantity down to something the exchange accepts
    pub fn round_quantity(&self, raw: Decimal) -> Decimal {
        round_to_step(round_down_to_precision(raw, self.quantity_precision), self.step_size)
    }
}

/// `floor(qty * 10^precision) / 10^precision`
pub fn round_down_to_precision(quantity: Decimal, precision: u32) -> Decimal {
    quantity.round_dp_with_strategy(precision, RoundingStrategy::ToNegativeInfinity)
}

/// Largest multiple of `step` not above `quantity`
pub fn round_to_step(quantity: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return quantity;
    }
    (quantity / step).floor() * step
}

/// `ceil(max(min_qty, min_notional / mark_price) / step) * step`
pub fn min_order_quantity(
    min_qty: Decimal,
    min_notional: Decimal,
    mark_price: Decimal,
    step: Decimal,
) -> Decimal {
    let notional_qty = if mark_price > Decimal::ZERO {
        min_notional / mark_price
    } else {
        Decimal::ZERO
    };
    let floor_qty = min_qty.max(notional_qty);

    if step <= Decimal::ZERO {
        return floor_qty;
    }
    (floor_qty / step).ceil() * step
}

/// Derives per-symbol rounding rules from the exchange
///
/// Every query hits the exchange for fresh metadata and a fresh mark price.
pub struct PrecisionResolver<'a> {
    exchange: &'a dyn ExchangeClient,
}

impl<'a> PrecisionResolver<'a> {
    pub fn new(exchange: &'a dyn ExchangeClient) -> Self {
        Self { exchange }
    }

    /// Decimal places allowed for order quantity
    #[instrument(skip(self))]
    pub async fn quantity_precision(&self, symbol: &str) -> Result<u32> {
        let metadata = self.exchange.symbol_metadata().await?;
        metadata
            .get(symbol)
            .map(|info| info.quantity_precision)
            .ok_or_else(|| DeskError::UnknownSymbol(symbol.to_string()))
    }

    /// Smallest quantity satisfying the minimum quantity and minimum notional filters
    #[instrument(skip(self))]
    pub async fn min_order_quantity(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.resolve(symbol).await?.min_order_quantity())
    }

    /// Full rule set for a symbol
    #[instrument(skip(self))]
    pub async fn resolve(&self, symbol: &str) -> Result<ExchangeSymbolSpec> {
        let metadata = self.exchange.symbol_metadata().await?;
        let info = metadata
            .get(symbol)
            .ok_or_else(|| DeskError::UnknownSymbol(symbol.to_string()))?;

        if !info.tradable {
            return Err(DeskError::SymbolNotTradable(symbol.to_string()));
        }
        let lot = info
            .market_lot_size
            .ok_or_else(|| DeskError::UnsupportedOrderType(symbol.to_string()))?;

        let mark_price = self.exchange.mark_price(symbol).await?;
        if mark_price <= Decimal::ZERO {
            return Err(DeskError::InvalidResponse(format!(
                "non-positive mark price {} for {}",
                mark_price, symbol
            )));
        }

        let spec = ExchangeSymbolSpec {
            symbol: symbol.to_string(),
            quantity_precision: info.quantity_precision,
            step_size: lot.step_size,
            min_quantity: lot.min_qty,
            min_notional: info.min_notional.unwrap_or(Decimal::ZERO),
            mark_price,
        };
        debug!(?spec, "resolved symbol rules");
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::MockExchangeClient;
    use crate::common::types::{LotSize, SymbolMetadata};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn metadata(tradable: bool, lot: Option<LotSize>) -> HashMap<String, SymbolMetadata> {
        let mut map = HashMap::new();
        map.insert(
            "BTCUSDT".to_string(),
            SymbolMetadata {
                symbol: "BTCUSDT".to_string(),
                quantity_precision: 3,
                tradable,
                market_lot_size: lot,
                min_notional: Some(dec!(100)),
            },
        );
        map
    }

    fn btc_lot() -> Option<LotSize> {
        Some(LotSize {
            min_qty: dec!(0.001),
            step_size: dec!(0.001),
        })
    }

    #[test]
    fn test_min_order_quantity_rounds_notional_up() {
        let qty = min_order_quantity(dec!(0.001), dec!(100), dec!(94778.14413043), dec!(0.001));
        assert_eq!(qty, dec!(0.002));
    }

    #[test]
    fn test_min_order_quantity_uses_min_qty_when_larger() {
        let qty = min_order_quantity(dec!(1), dec!(5), dec!(100), dec!(0.1));
        assert_eq!(qty, dec!(1));
    }

    #[test]
    fn test_min_order_quantity_monotonic_in_notional() {
        let mut previous = Decimal::ZERO;
        for notional in [dec!(0), dec!(5), dec!(10), dec!(10.5), dec!(99), dec!(250), dec!(1000)] {
            let qty = min_order_quantity(dec!(0.01), notional, dec!(100), dec!(0.01));
            assert!(qty >= previous, "{} < {} at notional {}", qty, previous, notional);
            previous = qty;
        }
    }

    #[test]
    fn test_round_to_step_is_idempotent() {
        let steps = [dec!(0.001), dec!(0.01), dec!(0.5), dec!(1), dec!(25)];
        let values = [dec!(0.0004), dec!(1.23456), dec!(7.5), dec!(99.999), dec!(1234.5678)];

        for step in steps {
            for value in values {
                let once = round_to_step(value, step);
                assert_eq!(round_to_step(once, step), once);
                assert!(once <= value);
            }
        }
    }

    #[test]
    fn test_round_down_to_precision() {
        assert_eq!(round_down_to_precision(dec!(0.123987), 3), dec!(0.123));
        assert_eq!(round_down_to_precision(dec!(5), 2), dec!(5));
        assert_eq!(round_down_to_precision(dec!(0.0008), 3), dec!(0));
    }

    #[tokio::test]
    async fn test_resolve_builds_spec() {
        let mut exchange = MockExchangeClient::new();
        exchange
            .expect_symbol_metadata()
            .times(1)
            .returning(|| Ok(metadata(true, btc_lot())));
        exchange
            .expect_mark_price()
            .withf(|symbol| symbol == "BTCUSDT")
            .times(1)
            .returning(|_| Ok(dec!(94778.14413043)));

        let resolver = PrecisionResolver::new(&exchange);
        let spec = resolver.resolve("BTCUSDT").await.unwrap();

        assert_eq!(spec.quantity_precision, 3);
        assert_eq!(spec.min_order_quantity(), dec!(0.002));
        assert_eq!(spec.round_quantity(dec!(0.0057)), dec!(0.005));
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let mut exchange = MockExchangeClient::new();
        exchange
            .expect_symbol_metadata()
            .returning(|| Ok(metadata(true, btc_lot())));

        let resolver = PrecisionResolver::new(&exchange);
        let err = resolver.quantity_precision("DOGEUSDT").await.unwrap_err();
        assert!(matches!(err, DeskError::UnknownSymbol(s) if s == "DOGEUSDT"));
    }

    #[tokio::test]
    async fn test_inactive_symbol_not_tradable() {
        let mut exchange = MockExchangeClient::new();
        exchange
            .expect_symbol_metadata()
            .returning(|| Ok(metadata(false, btc_lot())));
        exchange.expect_mark_price().never();

        let resolver = PrecisionResolver::new(&exchange);
        let err = resolver.min_order_quantity("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, DeskError::SymbolNotTradable(_)));
    }

    #[tokio::test]
    async fn test_missing_market_lot_size() {
        let mut exchange = MockExchangeClient::new();
        exchange
            .expect_symbol_metadata()
            .returning(|| Ok(metadata(true, None)));

        let resolver = PrecisionResolver::new(&exchange);
        let err = resolver.min_order_quantity("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, DeskError::UnsupportedOrderType(_)));
    }

    #[tokio::test]
    async fn test_metadata_fetched_on_every_query() {
        let mut exchange = MockExchangeClient::new();
        exchange
            .expect_symbol_metadata()
            .times(2)
            .returning(|| Ok(metadata(true, btc_lot())));
        exchange
            .expect_mark_price()
            .times(1)
            .returning(|_| Ok(dec!(50000)));

        let resolver = PrecisionResolver::new(&exchange);
        assert_eq!(resolver.quantity_precision("BTCUSDT").await.unwrap(), 3);
        assert_eq!(resolver.min_order_quantity("BTCUSDT").await.unwrap(), dec!(0.002));
    }
}
