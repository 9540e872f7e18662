//! Configuration types

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{DeskError, Result};
use crate::common::types::{Interval, TimeUnit};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trading session configuration
    pub session: SessionConfig,
    /// Strategy configuration
    pub strategy: StrategyConfig,
    /// Binance connection configuration
    #[serde(default)]
    pub binance: BinanceConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Trading session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session label, also names the journal file
    pub session_name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Simulate fills instead of placing real orders
    #[serde(default = "default_is_mock")]
    pub is_mock: bool,
    /// Symbols the session trades, in journal column order
    pub traded_assets: Vec<String>,
    /// Declared number of traded symbols
    pub n_traded_assets: usize,
    /// Starting capital in quote currency
    pub init_capital: Decimal,
    /// Taker fee as a fraction of notional
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
}

fn default_is_mock() -> bool {
    true
}

fn default_fee_rate() -> Decimal {
    dec!(0.0005)
}

/// How the budget is split across selected symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingPolicy {
    Equal,
}

/// Strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Registered strategy name
    pub strategy_name: String,
    /// Candle unit
    pub unit: TimeUnit,
    /// Candle size in units
    pub every: u32,
    /// Number of symbols to hold long
    pub n_asset_buy: usize,
    /// Number of symbols to hold short
    pub n_asset_sell: usize,
    /// Budget split policy
    #[serde(default = "default_weighting")]
    pub asset_weight_type: WeightingPolicy,
}

fn default_weighting() -> WeightingPolicy {
    WeightingPolicy::Equal
}

impl StrategyConfig {
    pub fn interval(&self) -> Interval {
        Interval::new(self.unit, self.every)
    }

    /// Total number of symbols the budget is split across
    pub fn selected_count(&self) -> usize {
        self.n_asset_buy + self.n_asset_sell
    }
}

/// Binance USD-M futures configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    /// API key for signed requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Base URL for the futures REST API
    #[serde(default = "default_binance_rest_url")]
    pub rest_url: String,
    /// Validity window of signed requests in milliseconds
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            rest_url: default_binance_rest_url(),
            recv_window_ms: default_recv_window(),
        }
    }
}

impl BinanceConfig {
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

fn default_binance_rest_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_recv_window() -> u64 {
    5000
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Pause between the close and signal phases in seconds
    #[serde(default = "default_signal_delay")]
    pub signal_delay_seconds: u64,
    /// Directory for journal files
    #[serde(default = "default_journal_dir")]
    pub journal_dir: String,
    /// Directory for per-session log files
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            signal_delay_seconds: default_signal_delay(),
            journal_dir: default_journal_dir(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_signal_delay() -> u64 {
    5
}

fn default_journal_dir() -> String {
    "./journal".to_string()
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

/// API credentials for signed requests
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***")
            .finish()
    }
}

/// Keep the first four characters of a secret
pub fn mask(secret: &str) -> String {
    let head: String = secret.chars().take(4).collect();
    format!("{}***", head)
}

impl AppConfig {
    /// Session-start checks; nothing here is re-checked mid-cycle
    pub fn validate(&self) -> Result<()> {
        let session = &self.session;
        let strategy = &self.strategy;

        if session.session_name.trim().is_empty() {
            return Err(DeskError::Configuration("session_name is empty".to_string()));
        }
        if session.traded_assets.len() != session.n_traded_assets {
            return Err(DeskError::Configuration(format!(
                "traded_assets lists {} symbols but n_traded_assets is {}",
                session.traded_assets.len(),
                session.n_traded_assets
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = session.traded_assets.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(DeskError::Configuration(format!("duplicate traded symbol {}", dup)));
        }
        if session.init_capital <= Decimal::ZERO {
            return Err(DeskError::Configuration(format!(
                "init_capital must be positive, got {}",
                session.init_capital
            )));
        }
        if session.fee_rate < Decimal::ZERO || session.fee_rate >= Decimal::ONE {
            return Err(DeskError::Configuration(format!(
                "fee_rate must be in [0, 1), got {}",
                session.fee_rate
            )));
        }

        let selected = strategy.selected_count();
        if selected == 0 {
            return Err(DeskError::Configuration(
                "n_asset_buy + n_asset_sell must be positive".to_string(),
            ));
        }
        if selected > session.n_traded_assets {
            return Err(DeskError::Configuration(format!(
                "{} buy + {} sell exceeds {} traded symbols",
                strategy.n_asset_buy, strategy.n_asset_sell, session.n_traded_assets
            )));
        }

        let supported = strategy.unit.supported_steps();
        if !supported.contains(&strategy.every) {
            return Err(DeskError::Configuration(format!(
                "interval {} is not a supported kline interval; every must be one of {:?} for unit '{}'",
                strategy.interval(),
                supported,
                strategy.unit
            )));
        }

        if !session.is_mock && self.binance.credentials().is_none() {
            return Err(DeskError::Configuration(
                "live trading requires BINANCE_API_KEY and BINANCE_SECRET_KEY".to_string(),
            ));
        }

        Ok(())
    }

    /// Two-column table of the effective configuration, secrets masked
    pub fn config_table(&self) -> String {
        const NAME_WIDTH: usize = 40;
        const VALUE_WIDTH: usize = 40;
        const SYMBOLS_PER_ROW: usize = 5;

        let mut lines = vec![
            format!("{:^NAME_WIDTH$} | {:^VALUE_WIDTH$}", "Config", "Value"),
            format!("{}-+-{}", "-".repeat(NAME_WIDTH), "-".repeat(VALUE_WIDTH)),
        ];
        let mut row = |name: &str, value: String| {
            lines.push(format!("{:<NAME_WIDTH$} | {:>VALUE_WIDTH$}", name, value));
        };

        row("session.session_name", self.session.session_name.clone());
        row("session.description", self.session.description.clone());
        row("session.is_mock", self.session.is_mock.to_string());
        for (i, chunk) in self.session.traded_assets.chunks(SYMBOLS_PER_ROW).enumerate() {
            let name = if i == 0 { "session.traded_assets" } else { "" };
            row(name, chunk.join(", "));
        }
        row("session.n_traded_assets", self.session.n_traded_assets.to_string());
        row("session.init_capital", self.session.init_capital.to_string());
        row("session.fee_rate", self.session.fee_rate.to_string());
        row("strategy.strategy_name", self.strategy.strategy_name.clone());
        row("strategy.interval", self.strategy.interval().code());
        row("strategy.n_asset_buy", self.strategy.n_asset_buy.to_string());
        row("strategy.n_asset_sell", self.strategy.n_asset_sell.to_string());
        row("strategy.asset_weight_type", format!("{:?}", self.strategy.asset_weight_type).to_lowercase());
        row("binance.rest_url", self.binance.rest_url.clone());
        row(
            "binance.api_key",
            self.binance.api_key.as_deref().map(mask).unwrap_or_else(|| "-".to_string()),
        );
        row("settings.request_timeout_seconds", self.settings.request_timeout_seconds.to_string());
        row("settings.signal_delay_seconds", self.settings.signal_delay_seconds.to_string());
        row("settings.journal_dir", self.settings.journal_dir.clone());
        row("settings.log_dir", self.settings.log_dir.clone());

        lines.join("\n")
    }
}
