//! Configuration module - Session, strategy and connection settings

pub mod loader;
pub mod types;

pub use loader::load_config;
pub use types::{
    ApiCredentials, AppConfig, AppSettings, BinanceConfig, SessionConfig, StrategyConfig,
    WeightingPolicy,
};
