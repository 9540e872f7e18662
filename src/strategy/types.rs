use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::common::errors::{DeskError, Result};
use crate::common::types::PositionSide;

/// Symbol-indexed table of closing prices, oldest first
///
/// Keeps the insertion order of symbols so strategies see the configured
/// traded-symbol order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceWindow {
    symbols: Vec<String>,
    closes: HashMap<String, Vec<Decimal>>,
}

impl PriceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a symbol's series
    pub fn insert(&mut self, symbol: impl Into<String>, closes: Vec<Decimal>) {
        let symbol = symbol.into();
        if !self.closes.contains_key(&symbol) {
            self.symbols.push(symbol.clone());
        }
        self.closes.insert(symbol, closes);
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn closes(&self, symbol: &str) -> Option<&[Decimal]> {
        self.closes.get(symbol).map(Vec::as_slice)
    }

    /// Iterate `(symbol, closes)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Decimal])> {
        self.symbols
            .iter()
            .filter_map(|s| self.closes.get(s).map(|c| (s.as_str(), c.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Check that every series has exactly `steps` closes
    pub fn ensure_steps(&self, steps: usize) -> Result<()> {
        if self.is_empty() {
            return Err(DeskError::InvalidSignalInput("price window is empty".to_string()));
        }
        for (symbol, closes) in self.iter() {
            if closes.len() != steps {
                return Err(DeskError::InvalidSignalInput(format!(
                    "{} has {} closes, expected {}",
                    symbol,
                    closes.len(),
                    steps
                )));
            }
        }
        Ok(())
    }
}

/// Symbols a strategy wants to hold long and short this cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalTargets {
    pub long: BTreeSet<String>,
    pub short: BTreeSet<String>,
}

impl SignalTargets {
    pub fn new(long: BTreeSet<String>, short: BTreeSet<String>) -> Self {
        Self { long, short }
    }

    /// Side a symbol should be held at; anything unselected is flat
    pub fn side_for(&self, symbol: &str) -> PositionSide {
        if self.long.contains(symbol) {
            PositionSide::Long
        } else if self.short.contains(symbol) {
            PositionSide::Short
        } else {
            PositionSide::Flat
        }
    }

    /// Check the output contract: disjoint sets within the configured counts,
    /// drawn only from the traded symbols
    pub fn validate(&self, buy_count: usize, sell_count: usize, traded: &[String]) -> Result<()> {
        if let Some(symbol) = self.long.intersection(&self.short).next() {
            return Err(DeskError::InvalidSignalOutput(format!(
                "{} selected both long and short",
                symbol
            )));
        }
        if self.long.len() > buy_count {
            return Err(DeskError::InvalidSignalOutput(format!(
                "{} long targets exceed buy count {}",
                self.long.len(),
                buy_count
            )));
        }
        if self.short.len() > sell_count {
            return Err(DeskError::InvalidSignalOutput(format!(
                "{} short targets exceed sell count {}",
                self.short.len(),
                sell_count
            )));
        }
        if let Some(symbol) = self
            .long
            .iter()
            .chain(self.short.iter())
            .find(|s| !traded.contains(*s))
        {
            return Err(DeskError::InvalidSignalOutput(format!(
                "{} is not a traded symbol",
                symbol
            )));
        }
        Ok(())
    }
}
