//! Journal sinks for lifecycle records
//!
//! Every sink renders the same row layout: a UTC timestamp, five columns per
//! traded symbol, then the phase label and the ledger snapshot.

pub mod file;
pub mod memory;

pub use file::CsvJournal;
pub use memory::{JournalRecord, MemoryJournal, SessionHeader};

use chrono::{DateTime, Utc};

use crate::common::types::{JournalPhase, Position};
use crate::desk::ledger::LedgerSnapshot;

/// Per-symbol column names, in row order
pub const POSITION_COLUMNS: [&str; 5] = [
    "fetched_price",
    "position",
    "entry_price",
    "amount",
    "quantity",
];

/// Trailing account columns, in row order
pub const ACCOUNT_COLUMNS: [&str; 4] = ["open_close", "collateral_long", "collateral_short", "capital"];

/// Timestamp format of the first column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Column headings for a session trading `symbols`
pub fn header_row(symbols: &[String]) -> Vec<String> {
    let mut row = Vec::with_capacity(1 + symbols.len() * POSITION_COLUMNS.len() + ACCOUNT_COLUMNS.len());
    row.push("timestamp".to_string());
    for symbol in symbols {
        row.extend(POSITION_COLUMNS.iter().map(|c| format!("{}_{}", symbol, c)));
    }
    row.extend(ACCOUNT_COLUMNS.iter().map(|c| c.to_string()));
    row
}

/// One journal row for a phase
pub fn phase_row(
    timestamp: DateTime<Utc>,
    positions: &[Position],
    phase: JournalPhase,
    ledger: &LedgerSnapshot,
) -> Vec<String> {
    let mut row = Vec::with_capacity(1 + positions.len() * POSITION_COLUMNS.len() + ACCOUNT_COLUMNS.len());
    row.push(timestamp.format(TIMESTAMP_FORMAT).to_string());

    for position in positions {
        row.push(position.fetched_price.normalize().to_string());
        row.push(position.side.signum().to_string());
        row.push(position.entry_price.normalize().to_string());
        row.push(position.notional_amount.normalize().to_string());
        row.push(position.quantity.normalize().to_string());
    }

    row.push(phase.to_string());
    row.push(ledger.collateral_long.normalize().to_string());
    row.push(ledger.collateral_short.normalize().to_string());
    row.push(ledger.capital.normalize().to_string());
    row
}
