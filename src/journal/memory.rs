//! In-memory journal for tests and dry runs

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::phase_row;
use crate::common::errors::{DeskError, Result};
use crate::common::traits::TransactionJournal;
use crate::common::types::{JournalPhase, Position};
use crate::desk::ledger::LedgerSnapshot;

/// Session header written by `initialize_session`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHeader {
    pub strategy_name: String,
    pub initial_capital: Decimal,
    pub traded_symbols: Vec<String>,
}

/// One appended phase
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRecord {
    pub recorded_at: DateTime<Utc>,
    pub phase: JournalPhase,
    pub positions: Vec<Position>,
    pub ledger: LedgerSnapshot,
}

impl JournalRecord {
    /// The record rendered as a journal row
    pub fn to_row(&self) -> Vec<String> {
        phase_row(self.recorded_at, &self.positions, self.phase, &self.ledger)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    header: Option<SessionHeader>,
    records: Vec<JournalRecord>,
}

/// Cloneable journal; clones share the same record list
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DeskError::Journal("memory journal lock poisoned".to_string()))
    }

    pub fn header(&self) -> Option<SessionHeader> {
        self.lock().ok().and_then(|s| s.header.clone())
    }

    pub fn records(&self) -> Vec<JournalRecord> {
        self.lock().map(|s| s.records.clone()).unwrap_or_default()
    }

    /// Records of one phase, oldest first
    pub fn phase_records(&self, phase: JournalPhase) -> Vec<JournalRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.phase == phase)
            .collect()
    }
}

#[async_trait]
impl TransactionJournal for MemoryJournal {
    async fn initialize_session(
        &self,
        strategy_name: &str,
        initial_capital: Decimal,
        traded_symbols: &[String],
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.header = Some(SessionHeader {
            strategy_name: strategy_name.to_string(),
            initial_capital,
            traded_symbols: traded_symbols.to_vec(),
        });
        Ok(())
    }

    async fn append_phase(
        &self,
        positions: &[Position],
        phase: JournalPhase,
        ledger: &LedgerSnapshot,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.records.push(JournalRecord {
            recorded_at: Utc::now(),
            phase,
            positions: positions.to_vec(),
            ledger: *ledger,
        });
        Ok(())
    }
}
