//! Execution venues other than the live exchange

pub mod paper;

pub use paper::PaperExchange;
