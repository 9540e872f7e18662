//! Cross-sectional momentum over a fixed lookback

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::debug;

use crate::common::errors::{DeskError, Result};
use crate::strategy::traits::StrategySignal;
use crate::strategy::types::{PriceWindow, SignalTargets};

/// Registered name of [`Momentum`]
pub const MOMENTUM1: &str = "momentum1";

/// Default lookback: 13 completed buckets
pub const DEFAULT_LOOKBACK: usize = 13;

/// Ranks symbols by return over the window, buys the strongest and sells the weakest
#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
}

/// One symbol's score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSymbol {
    pub symbol: String,
    pub momentum: Decimal,
}

impl Momentum {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Return over the window per symbol, best first; ties ordered by symbol
    pub fn rank(&self, window: &PriceWindow) -> Result<Vec<RankedSymbol>> {
        window.ensure_steps(self.lookback)?;

        let mut ranked = Vec::with_capacity(window.len());
        for (symbol, closes) in window.iter() {
            let (first, last) = match (closes.first(), closes.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => {
                    return Err(DeskError::InvalidSignalInput(format!(
                        "{} has an empty series",
                        symbol
                    )))
                }
            };
            if first <= Decimal::ZERO {
                return Err(DeskError::InvalidSignalInput(format!(
                    "{} has non-positive opening close {}",
                    symbol, first
                )));
            }
            ranked.push(RankedSymbol {
                symbol: symbol.to_string(),
                momentum: last / first - Decimal::ONE,
            });
        }

        ranked.sort_by(|a, b| match b.momentum.cmp(&a.momentum) {
            Ordering::Equal => a.symbol.cmp(&b.symbol),
            other => other,
        });
        Ok(ranked)
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl StrategySignal for Momentum {
    fn name(&self) -> &str {
        MOMENTUM1
    }

    fn window_len(&self) -> usize {
        self.lookback
    }

    fn compute_targets(
        &self,
        window: &PriceWindow,
        buy_count: usize,
        sell_count: usize,
    ) -> Result<SignalTargets> {
        let ranked = self.rank(window)?;

        let long: BTreeSet<String> = ranked
            .iter()
            .take(buy_count)
            .map(|r| r.symbol.clone())
            .collect();
        let short: BTreeSet<String> = ranked
            .iter()
            .rev()
            .filter(|r| !long.contains(&r.symbol))
            .take(sell_count)
            .map(|r| r.symbol.clone())
            .collect();

        debug!(?ranked, ?long, ?short, "momentum ranking");
        Ok(SignalTargets::new(long, short))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(first: Decimal, last: Decimal) -> Vec<Decimal> {
        let mut closes = vec![first; DEFAULT_LOOKBACK - 1];
        closes.push(last);
        closes
    }

    fn window() -> PriceWindow {
        let mut window = PriceWindow::new();
        window.insert("BTCUSDT", series(dec!(100), dec!(110)));
        window.insert("ETHUSDT", series(dec!(100), dec!(90)));
        window.insert("SOLUSDT", series(dec!(100), dec!(125)));
        window.insert("BNBUSDT", series(dec!(100), dec!(100)));
        window
    }

    #[test]
    fn test_rank_orders_by_return() {
        let ranked = Momentum::default().rank(&window()).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["SOLUSDT", "BTCUSDT", "BNBUSDT", "ETHUSDT"]);
        assert_eq!(ranked[0].momentum, dec!(0.25));
    }

    #[test]
    fn test_targets_long_strongest_short_weakest() {
        let targets = Momentum::default().compute_targets(&window(), 1, 1).unwrap();
        assert_eq!(targets.long.iter().collect::<Vec<_>>(), vec!["SOLUSDT"]);
        assert_eq!(targets.short.iter().collect::<Vec<_>>(), vec!["ETHUSDT"]);
    }

    #[test]
    fn test_targets_stay_disjoint_when_counts_cover_everything() {
        let targets = Momentum::default().compute_targets(&window(), 3, 3).unwrap();
        assert_eq!(targets.long.len(), 3);
        assert_eq!(targets.short.len(), 1);
        assert!(targets.long.is_disjoint(&targets.short));
    }

    #[test]
    fn test_ties_break_by_symbol() {
        let mut window = PriceWindow::new();
        window.insert("ETHUSDT", series(dec!(10), dec!(11)));
        window.insert("BTCUSDT", series(dec!(10), dec!(11)));

        let targets = Momentum::default().compute_targets(&window, 1, 0).unwrap();
        assert!(targets.long.contains("BTCUSDT"));
    }

    #[test]
    fn test_wrong_window_length_is_invalid_input() {
        let mut window = PriceWindow::new();
        window.insert("BTCUSDT", vec![dec!(1); 12]);

        let err = Momentum::default().compute_targets(&window, 1, 1).unwrap_err();
        assert!(matches!(err, DeskError::InvalidSignalInput(_)));
    }

    #[test]
    fn test_zero_opening_close_is_invalid_input() {
        let mut window = PriceWindow::new();
        window.insert("BTCUSDT", series(dec!(0), dec!(1)));

        assert!(Momentum::default().compute_targets(&window, 1, 0).is_err());
    }
}
