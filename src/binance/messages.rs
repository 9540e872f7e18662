//! Binance USD-M futures REST message types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{LotSize, OrderStatus, SymbolMetadata};

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// Response from GET /fapi/v1/time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    pub server_time: i64,
}

/// Response from GET /fapi/v1/ticker/price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: Decimal,
    #[serde(default)]
    pub time: Option<i64>,
}

/// Response from GET /fapi/v1/premiumIndex
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndexResponse {
    pub symbol: String,
    pub mark_price: Decimal,
    #[serde(default)]
    pub index_price: Option<Decimal>,
    #[serde(default)]
    pub last_funding_rate: Option<Decimal>,
    #[serde(default)]
    pub time: Option<i64>,
}

/// Response from GET /fapi/v1/exchangeInfo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfoResponse {
    #[serde(default)]
    pub server_time: Option<i64>,
    pub symbols: Vec<SymbolInfo>,
}

/// One listed contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub contract_type: Option<String>,
    pub quantity_precision: u32,
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
    #[serde(default)]
    pub order_types: Vec<String>,
}

/// Symbol filters; only the ones sizing depends on are decoded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "MARKET_LOT_SIZE")]
    MarketLotSize {
        #[serde(rename = "minQty")]
        min_qty: Decimal,
        #[serde(rename = "stepSize")]
        step_size: Decimal,
        #[serde(rename = "maxQty", default)]
        max_qty: Option<Decimal>,
    },
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional { notional: Decimal },
    #[serde(other)]
    Other,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }

    pub fn market_lot_size(&self) -> Option<LotSize> {
        self.filters.iter().find_map(|f| match f {
            SymbolFilter::MarketLotSize {
                min_qty, step_size, ..
            } => Some(LotSize {
                min_qty: *min_qty,
                step_size: *step_size,
            }),
            _ => None,
        })
    }

    pub fn min_notional(&self) -> Option<Decimal> {
        self.filters.iter().find_map(|f| match f {
            SymbolFilter::MinNotional { notional } => Some(*notional),
            _ => None,
        })
    }

    pub fn to_metadata(&self) -> SymbolMetadata {
        SymbolMetadata {
            symbol: self.symbol.clone(),
            quantity_precision: self.quantity_precision,
            tradable: self.is_trading(),
            market_lot_size: self.market_lot_size(),
            min_notional: self.min_notional(),
        }
    }
}

/// Positional kline array from GET /fapi/v1/klines
///
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_buy_base, taker_buy_quote, ignore]`
pub type RawKline = (
    i64,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    i64,
    Decimal,
    u64,
    Decimal,
    Decimal,
    serde_json::Value,
);

/// Decoded kline
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
}

impl From<RawKline> for Kline {
    fn from(raw: RawKline) -> Self {
        Self {
            open_time: raw.0,
            open: raw.1,
            high: raw.2,
            low: raw.3,
            close: raw.4,
            volume: raw.5,
            close_time: raw.6,
        }
    }
}

/// Response from POST /fapi/v1/order with `newOrderRespType=RESULT`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub executed_qty: Decimal,
    #[serde(default)]
    pub avg_price: Decimal,
    #[serde(default)]
    pub cum_quote: Decimal,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub update_time: Option<i64>,
}
