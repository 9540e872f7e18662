//! Shared types used across the desk, the exchange clients and the journals

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity recorded for a target that was below the exchange minimum
pub const REJECTED_QUANTITY: Decimal = Decimal::NEGATIVE_ONE;

/// Exposure direction of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    /// +1, -1 or 0
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
            PositionSide::Flat => Decimal::ZERO,
        }
    }

    /// Integer form used by the journal columns
    pub fn signum(&self) -> i8 {
        match self {
            PositionSide::Long => 1,
            PositionSide::Short => -1,
            PositionSide::Flat => 0,
        }
    }

    /// Side of the trade that closes this exposure
    pub fn offset(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
            PositionSide::Flat => PositionSide::Flat,
        }
    }

    /// Order side that moves exposure in this direction
    pub fn order_side(&self) -> Option<OrderSide> {
        match self {
            PositionSide::Long => Some(OrderSide::Buy),
            PositionSide::Short => Some(OrderSide::Sell),
            PositionSide::Flat => None,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
            PositionSide::Flat => write!(f, "flat"),
        }
    }
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Candle time unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "m")]
    Minute,
    #[serde(rename = "h")]
    Hour,
}

impl TimeUnit {
    fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 3600,
        }
    }

    /// Bucket sizes the futures kline endpoint accepts for this unit
    ///
    /// Each one divides the enclosing clock cycle (an hour of minutes, a day
    /// of hours), so buckets stay aligned to UTC boundaries.
    pub fn supported_steps(&self) -> &'static [u32] {
        match self {
            TimeUnit::Minute => &[1, 3, 5, 15, 30],
            TimeUnit::Hour => &[1, 2, 4, 6, 8, 12],
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Minute => write!(f, "m"),
            TimeUnit::Hour => write!(f, "h"),
        }
    }
}

/// Candle bucket size, e.g. every 4 hours
///
/// Buckets are aligned to the enclosing clock cycle in UTC, so a 4h interval
/// has boundaries at 00:00, 04:00, 08:00 and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub unit: TimeUnit,
    pub every: u32,
}

impl Interval {
    pub fn new(unit: TimeUnit, every: u32) -> Self {
        Self { unit, every }
    }

    /// Length of one bucket
    pub fn bucket(&self) -> Duration {
        Duration::seconds(self.unit.seconds() * i64::from(self.every))
    }

    /// Exchange interval code, e.g. `4h`
    pub fn code(&self) -> String {
        format!("{}{}", self.every, self.unit)
    }

    /// Most recent bucket boundary at or before `now`
    pub fn aligned_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = match self.unit {
            TimeUnit::Minute => i64::from(now.minute()) * 60 + i64::from(now.second()),
            TimeUnit::Hour => i64::from(now.num_seconds_from_midnight()),
        };
        let bucket_secs = self.bucket().num_seconds().max(1);
        let excess = elapsed % bucket_secs;

        now - Duration::seconds(excess) - Duration::nanoseconds(i64::from(now.nanosecond()))
    }

    /// Start and end of a window of `steps` completed buckets ending at the last boundary
    pub fn window(&self, now: DateTime<Utc>, steps: usize) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.aligned_end(now);
        let start = end - self.bucket() * steps as i32;
        (start, end)
    }

    /// First boundary strictly after `now`
    pub fn next_boundary_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.aligned_end(now) + self.bucket()
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One symbol's exposure for a cycle
///
/// Positions are built fresh every cycle and never edited once they join a
/// held set. `notional_amount` is the fee-adjusted cash flow of the trade that
/// produced the position: negative for an outflow, positive for an inflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    /// Last observed market price at sizing time (0 if never fetched)
    pub fetched_price: Decimal,
    /// Execution price (0 until filled)
    pub entry_price: Decimal,
    /// Step-rounded quantity, or [`REJECTED_QUANTITY`]
    pub quantity: Decimal,
    pub notional_amount: Decimal,
}

impl Position {
    /// Placeholder for a symbol with no exposure this cycle
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side: PositionSide::Flat,
            fetched_price: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            quantity: Decimal::ZERO,
            notional_amount: Decimal::ZERO,
        }
    }

    /// Target that was sized below the exchange minimum and never ordered
    pub fn rejected(symbol: impl Into<String>, side: PositionSide, fetched_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            fetched_price,
            entry_price: Decimal::ZERO,
            quantity: REJECTED_QUANTITY,
            notional_amount: Decimal::ZERO,
        }
    }

    /// Carries exposure that has to be closed
    pub fn is_open(&self) -> bool {
        self.side != PositionSide::Flat && self.quantity > Decimal::ZERO
    }

    pub fn is_rejected(&self) -> bool {
        self.quantity == REJECTED_QUANTITY
    }
}

/// Order status as reported by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    ExpiredInMatch,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::ExpiredInMatch => "EXPIRED_IN_MATCH",
            OrderStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Result of a market order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub order_id: i64,
    pub symbol: String,
    pub status: OrderStatus,
    pub executed_qty: Decimal,
    pub avg_price: Decimal,
    pub cum_quote: Decimal,
}

/// Market lot size filter of a symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotSize {
    pub min_qty: Decimal,
    pub step_size: Decimal,
}

/// Per-symbol trading rules from exchange metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMetadata {
    pub symbol: String,
    pub quantity_precision: u32,
    pub tradable: bool,
    /// `None` when the symbol cannot take market orders
    pub market_lot_size: Option<LotSize>,
    pub min_notional: Option<Decimal>,
}

/// Lifecycle phase a journal record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalPhase {
    Open,
    Close,
}

impl std::fmt::Display for JournalPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalPhase::Open => write!(f, "open"),
            JournalPhase::Close => write!(f, "close"),
        }
    }
}
