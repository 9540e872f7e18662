//! Capital and collateral ledger of a trading session

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fees::FeeCalculator;
use crate::common::types::PositionSide;

/// Point-in-time copy of the ledger, written to the journal after each phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub capital: Decimal,
    pub collateral_long: Decimal,
    pub collateral_short: Decimal,
}

/// What a settlement does to collateral
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Settlement {
    /// A new position locks its fee-adjusted notional
    Open,
    /// Closing releases exactly what the held position locked
    Close {
        held_side: PositionSide,
        held_amount: Decimal,
    },
}

/// Session ledger
///
/// Owned by the trading desk and only changed through [`Ledger::settle`].
/// Capital moves by the fee-adjusted cash flow of every trade, so opening a
/// short raises capital and opening a long lowers it; collateral tracks the
/// absolute notional locked on each side. Fees leak out of the system on
/// every trade, which means `capital + collateral` is not conserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    capital: Decimal,
    collateral_long: Decimal,
    collateral_short: Decimal,
}

impl Ledger {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            capital: initial_capital,
            collateral_long: Decimal::ZERO,
            collateral_short: Decimal::ZERO,
        }
    }

    pub fn capital(&self) -> Decimal {
        self.capital
    }

    pub fn collateral_long(&self) -> Decimal {
        self.collateral_long
    }

    pub fn collateral_short(&self) -> Decimal {
        self.collateral_short
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            capital: self.capital,
            collateral_long: self.collateral_long,
            collateral_short: self.collateral_short,
        }
    }

    /// Settle one trade and return its fee-adjusted notional
    ///
    /// `side` is the side of the trade itself: the position side when
    /// opening, the offsetting side when closing.
    pub fn settle(
        &mut self,
        kind: Settlement,
        side: PositionSide,
        price: Decimal,
        quantity: Decimal,
        fee_rate: Decimal,
    ) -> Decimal {
        let amount = FeeCalculator::net_settlement(side, price, quantity, fee_rate);

        match kind {
            Settlement::Open => match side {
                PositionSide::Long => self.collateral_long += amount.abs(),
                PositionSide::Short => self.collateral_short += amount.abs(),
                PositionSide::Flat => {}
            },
            Settlement::Close {
                held_side,
                held_amount,
            } => match held_side {
                PositionSide::Long => self.collateral_long -= held_amount.abs(),
                PositionSide::Short => self.collateral_short -= held_amount.abs(),
                PositionSide::Flat => {}
            },
        }
        self.capital += amount;

        debug_assert!(self.collateral_long >= Decimal::ZERO);
        debug_assert!(self.collateral_short >= Decimal::ZERO);
        debug!(
            ?kind,
            %side,
            %price,
            %quantity,
            %amount,
            capital = %self.capital,
            "settled trade"
        );

        amount
    }
}
