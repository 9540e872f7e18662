//! REST API client for Binance USD-M futures

use chrono::Utc;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::auth::{signed_query, API_KEY_HEADER};
use super::messages::*;
use crate::common::errors::{DeskError, Result};
use crate::common::types::OrderSide;
use crate::config::types::ApiCredentials;

/// Upper bound Binance accepts for a single klines request
pub const MAX_KLINES_LIMIT: usize = 1500;

/// Default recvWindow for signed requests
const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// REST API client for Binance USD-M futures
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. `https://fapi.binance.com`
    base_url: String,
    /// Optional API credentials for signed endpoints
    credentials: Option<ApiCredentials>,
    /// recvWindow sent with signed requests
    recv_window_ms: u64,
}

impl BinanceRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeskError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        })
    }

    /// Set API credentials for signed requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the recvWindow for signed requests
    pub fn recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Read the body and decode it, mapping HTTP and decode failures
    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(err) => (Some(err.code), err.msg),
                Err(_) => (None, body),
            };
            return Err(DeskError::HttpStatus {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                code,
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| DeskError::json_parse(endpoint, e, &body))
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;
        Self::decode(endpoint, response).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            DeskError::Authentication(format!("{} requires API credentials", endpoint))
        })?;

        let query = signed_query(
            &creds.api_secret,
            params,
            Utc::now().timestamp_millis(),
            self.recv_window_ms,
        )?;
        let url = format!("{}{}?{}", self.base_url, endpoint, query);
        debug!("POST {} {:?}", endpoint, params);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &creds.api_key)
            .send()
            .await?;
        Self::decode(endpoint, response).await
    }

    // ========================================================================
    // Public Endpoints (No Authentication Required)
    // ========================================================================

    /// Get server time in milliseconds
    #[instrument(skip(self))]
    pub async fn get_server_time(&self) -> Result<i64> {
        let response: ServerTimeResponse = self.get_public("/fapi/v1/time", &[]).await?;
        Ok(response.server_time)
    }

    /// Get trading rules for every listed contract
    #[instrument(skip(self))]
    pub async fn get_exchange_info(&self) -> Result<ExchangeInfoResponse> {
        self.get_public("/fapi/v1/exchangeInfo", &[]).await
    }

    /// Get the mark price of a symbol
    #[instrument(skip(self))]
    pub async fn get_mark_price(&self, symbol: &str) -> Result<Decimal> {
        let response: PremiumIndexResponse = self
            .get_public("/fapi/v1/premiumIndex", &[("symbol", symbol.to_string())])
            .await?;
        Ok(response.mark_price)
    }

    /// Get the last traded price of a symbol
    #[instrument(skip(self))]
    pub async fn get_ticker_price(&self, symbol: &str) -> Result<Decimal> {
        let response: TickerPriceResponse = self
            .get_public("/fapi/v1/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        Ok(response.price)
    }

    /// Get klines between two open times (milliseconds, inclusive)
    ///
    /// # Arguments
    /// * `symbol` - Contract symbol
    /// * `interval` - Interval code such as `4h` or `15m`
    /// * `start_ms` / `end_ms` - Window bounds
    /// * `limit` - Maximum rows, capped at [`MAX_KLINES_LIMIT`]
    #[instrument(skip(self))]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
        limit: usize,
    ) -> Result<Vec<Kline>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start_ms.to_string()),
            ("endTime", end_ms.to_string()),
            ("limit", limit.clamp(1, MAX_KLINES_LIMIT).to_string()),
        ];
        let rows: Vec<RawKline> = self.get_public("/fapi/v1/klines", &params).await?;
        Ok(rows.into_iter().map(Kline::from).collect())
    }

    // ========================================================================
    // Signed Endpoints
    // ========================================================================

    /// Place a market order and wait for its result
    #[instrument(skip(self))]
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderResponse> {
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("newOrderRespType", "RESULT".to_string()),
        ];
        self.post_signed("/fapi/v1/order", &params).await
    }
}
