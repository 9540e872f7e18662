//! Common module - Types, errors and capability traits shared by every component

pub mod errors;
pub mod traits;
pub mod types;
