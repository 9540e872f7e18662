use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::common::errors::{DeskError, Result};
use crate::common::types::PositionSide;

/// Proportional taker fee charged on every market order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    /// Fee as a fraction of notional (0.0005 = 0.05%)
    pub taker_fee_rate: Decimal,
}

impl FeeSchedule {
    /// Binance USD-M futures default taker fee
    pub fn binance_futures() -> Self {
        Self {
            taker_fee_rate: dec!(0.0005),
        }
    }

    pub fn new(taker_fee_rate: Decimal) -> Result<Self> {
        if taker_fee_rate < Decimal::ZERO || taker_fee_rate >= Decimal::ONE {
            return Err(DeskError::Configuration(format!(
                "fee rate must be in [0, 1), got {}",
                taker_fee_rate
            )));
        }
        Ok(Self { taker_fee_rate })
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::binance_futures()
    }
}

/// Settlement arithmetic shared by the close and open phases
///
/// The trade side decides the sign of the cash flow: buying (+1) pays out,
/// selling (-1) takes in. The fee multiplier `1 + side * rate` always works
/// against the trader: a buy pays more, a sell receives less.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Cash flow of a trade before fees: `-side * price * quantity`
    pub fn gross_settlement(side: PositionSide, price: Decimal, quantity: Decimal) -> Decimal {
        -side.sign() * price * quantity
    }

    /// Apply the proportional fee to a gross settlement
    pub fn apply_fee(gross: Decimal, side: PositionSide, fee_rate: Decimal) -> Decimal {
        gross * (Decimal::ONE + side.sign() * fee_rate)
    }

    /// Fee-adjusted cash flow of a trade
    pub fn net_settlement(
        side: PositionSide,
        price: Decimal,
        quantity: Decimal,
        fee_rate: Decimal,
    ) -> Decimal {
        Self::apply_fee(Self::gross_settlement(side, price, quantity), side, fee_rate)
    }

    /// Fee paid on a trade, always non-negative
    pub fn fee_paid(side: PositionSide, price: Decimal, quantity: Decimal, fee_rate: Decimal) -> Decimal {
        (Self::net_settlement(side, price, quantity, fee_rate)
            - Self::gross_settlement(side, price, quantity))
        .abs()
    }
}
