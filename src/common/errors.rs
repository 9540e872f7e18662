//! Error types for the application

use thiserror::Error;

/// Result type alias using our DeskError
pub type Result<T> = std::result::Result<T, DeskError>;

/// Longest response payload kept on a decode error
const MAX_PAYLOAD_CHARS: usize = 512;

/// Main error type for desk operations
#[derive(Error, Debug)]
pub enum DeskError {
    /// Connection, timeout or body read failures from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status returned by the exchange
    #[error("HTTP {status} from {endpoint}: {message} (code {code:?})")]
    HttpStatus {
        status: u16,
        endpoint: String,
        code: Option<i64>,
        message: String,
    },

    /// Response body could not be decoded
    #[error("JSON parsing error on {endpoint}: {source}; payload: {payload}")]
    JsonParse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
        payload: String,
    },

    /// Response decoded but carried unusable values
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Symbol missing from exchange metadata
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// Exchange reports the symbol as not trading
    #[error("Symbol is not tradable: {0}")]
    SymbolNotTradable(String),

    /// Symbol has no market lot size filter
    #[error("Symbol does not support market orders: {0}")]
    UnsupportedOrderType(String),

    /// Market order came back with a status other than FILLED
    #[error("Order {order_id} for {symbol} not filled (status {status})")]
    OrderNotFilled {
        symbol: String,
        order_id: i64,
        status: String,
    },

    /// Price window handed to a strategy has the wrong shape
    #[error("Invalid signal input: {0}")]
    InvalidSignalInput(String),

    /// Strategy returned targets that break the signal contract
    #[error("Invalid signal output: {0}")]
    InvalidSignalOutput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Journal sink failures
    #[error("Journal error: {0}")]
    Journal(String),
}

impl DeskError {
    /// Build a decode error, keeping a bounded copy of the offending payload
    pub fn json_parse(endpoint: impl Into<String>, source: serde_json::Error, payload: &str) -> Self {
        let payload = if payload.chars().count() > MAX_PAYLOAD_CHARS {
            let head: String = payload.chars().take(MAX_PAYLOAD_CHARS).collect();
            format!("{}...", head)
        } else {
            payload.to_string()
        };

        DeskError::JsonParse {
            endpoint: endpoint.into(),
            source,
            payload,
        }
    }

    /// True for failures of the HTTP exchange itself
    pub fn is_transport(&self) -> bool {
        matches!(self, DeskError::Transport(_) | DeskError::HttpStatus { .. })
    }
}

impl From<csv::Error> for DeskError {
    fn from(err: csv::Error) -> Self {
        DeskError::Journal(err.to_string())
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::Journal(err.to_string())
    }
}

impl From<config::ConfigError> for DeskError {
    fn from(err: config::ConfigError) -> Self {
        DeskError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_parse_truncates_payload() {
        let payload = "x".repeat(2000);
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DeskError::json_parse("/fapi/v1/klines", source, &payload);

        match err {
            DeskError::JsonParse { payload, endpoint, .. } => {
                assert_eq!(endpoint, "/fapi/v1/klines");
                assert_eq!(payload.len(), MAX_PAYLOAD_CHARS + 3);
                assert!(payload.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transport_classification() {
        let status = DeskError::HttpStatus {
            status: 503,
            endpoint: "/fapi/v1/ticker/price".to_string(),
            code: None,
            message: "unavailable".to_string(),
        };
        assert!(status.is_transport());
        assert!(!DeskError::UnknownSymbol("FOOUSDT".to_string()).is_transport());
    }
}
