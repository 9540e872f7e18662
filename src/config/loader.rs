//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{DeskError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`
/// 2. Environment variables (prefixed with APP__, sections split by `__`)
/// 3. Configuration file (TOML or JSON, picked by extension)
/// 4. Default values
///
/// The result is validated before it is returned.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if !Path::new(path).exists() {
            return Err(DeskError::Configuration(format!(
                "configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::with_name(path));
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("session.traded_assets"),
    );

    if let Ok(key) = std::env::var("BINANCE_API_KEY") {
        builder = builder.set_override("binance.api_key", key)?;
    }
    if let Ok(secret) = std::env::var("BINANCE_SECRET_KEY") {
        builder = builder.set_override("binance.api_secret", secret)?;
    }

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
