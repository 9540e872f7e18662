//! CSV file journal
//!
//! One file per session under the journal directory:
//! - `{journal_dir}/{session}.csv`
//! - `{journal_dir}/{session}_new_{YYYY_mm_dd_HH_MM_SS}.csv` when the first one already exists
//! - `{journal_dir}/{session}_new_{YYYY_mm_dd_HH_MM_SS}_{n}.csv` when that one exists too
//!
//! Files are created exclusively, so an existing journal is never truncated.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{header_row, phase_row};
use crate::common::errors::{DeskError, Result};
use crate::common::traits::TransactionJournal;
use crate::common::types::{JournalPhase, Position};
use crate::desk::ledger::LedgerSnapshot;

/// Append-only CSV journal
pub struct CsvJournal {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvJournal {
    /// Create the journal file for `session_name`, never reusing an existing one
    pub fn create(journal_dir: impl AsRef<Path>, session_name: &str) -> Result<Self> {
        let dir = journal_dir.as_ref();
        fs::create_dir_all(dir)?;

        let (path, file) = create_session_file(dir, session_name)?;
        let writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        info!(path = %path.display(), "Opened CSV journal");

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| DeskError::Journal("journal writer lock poisoned".to_string()))?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Most sibling names tried before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Exclusively create `<session>.csv`, falling back to timestamped siblings
fn create_session_file(dir: &Path, session_name: &str) -> Result<(PathBuf, File)> {
    let timestamp = Utc::now().format("%Y_%m_%d_%H_%M_%S").to_string();
    let candidates = std::iter::once(format!("{}.csv", session_name))
        .chain(std::iter::once(format!("{}_new_{}.csv", session_name, timestamp)))
        .chain((1..MAX_NAME_ATTEMPTS).map(|n| format!("{}_new_{}_{}.csv", session_name, timestamp, n)));

    for name in candidates {
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Journal file exists, trying next name");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(DeskError::Journal(format!(
        "no free journal file name for session {} in {}",
        session_name,
        dir.display()
    )))
}

#[async_trait]
impl TransactionJournal for CsvJournal {
    async fn initialize_session(
        &self,
        strategy_name: &str,
        initial_capital: Decimal,
        traded_symbols: &[String],
    ) -> Result<()> {
        let mut assets = vec!["traded_assets".to_string()];
        assets.extend(traded_symbols.iter().cloned());

        self.write_rows(&[
            vec!["strategy".to_string(), strategy_name.to_string()],
            vec!["initial_capital".to_string(), initial_capital.normalize().to_string()],
            assets,
            header_row(traded_symbols),
        ])
    }

    async fn append_phase(
        &self,
        positions: &[Position],
        phase: JournalPhase,
        ledger: &LedgerSnapshot,
    ) -> Result<()> {
        debug!(%phase, rows = positions.len(), "Appending journal row");
        self.write_rows(&[phase_row(Utc::now(), positions, phase, ledger)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PositionSide;
    use rust_decimal_macros::dec;

    fn symbols() -> Vec<String> {
        vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_session_header_block() {
        let dir = tempfile::tempdir().unwrap();
        let journal = CsvJournal::create(dir.path(), "session").unwrap();

        journal
            .initialize_session("momentum1", dec!(1000), &symbols())
            .await
            .unwrap();

        let rows = read_rows(journal.path());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec!["strategy", "momentum1"]);
        assert_eq!(rows[1], vec!["initial_capital", "1000"]);
        assert_eq!(rows[2], vec!["traded_assets", "BTCUSDT", "ETHUSDT"]);
        assert_eq!(rows[3].len(), 1 + 2 * 5 + 4);
    }

    #[tokio::test]
    async fn test_append_phase_row() {
        let dir = tempfile::tempdir().unwrap();
        let journal = CsvJournal::create(dir.path(), "session").unwrap();
        let positions = vec![
            Position {
                symbol: "BTCUSDT".to_string(),
                side: PositionSide::Long,
                fetched_price: dec!(100),
                entry_price: dec!(100),
                quantity: dec!(5),
                notional_amount: dec!(-500.25),
            },
            Position::flat("ETHUSDT"),
        ];
        let ledger = LedgerSnapshot {
            capital: dec!(499.75),
            collateral_long: dec!(500.25),
            collateral_short: dec!(0),
        };

        journal
            .append_phase(&positions, JournalPhase::Open, &ledger)
            .await
            .unwrap();

        let rows = read_rows(journal.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1..6], ["100", "1", "100", "-500.25", "5"]);
        assert_eq!(rows[0][11..], ["open", "500.25", "0", "499.75"]);
    }

    #[test]
    fn test_existing_session_file_is_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = CsvJournal::create(dir.path(), "session").unwrap();
        let second = CsvJournal::create(dir.path(), "session").unwrap();

        assert_eq!(first.path(), dir.path().join("session.csv"));
        assert_ne!(first.path(), second.path());
        let name = second.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("session_new_"));
    }

    #[tokio::test]
    async fn test_sessions_in_same_second_keep_their_rows() {
        let dir = tempfile::tempdir().unwrap();
        let first = CsvJournal::create(dir.path(), "session").unwrap();
        first
            .initialize_session("momentum1", dec!(1000), &symbols())
            .await
            .unwrap();
        let second = CsvJournal::create(dir.path(), "session").unwrap();
        second
            .initialize_session("momentum1", dec!(1000), &symbols())
            .await
            .unwrap();
        let ledger = LedgerSnapshot {
            capital: dec!(1000),
            collateral_long: dec!(0),
            collateral_short: dec!(0),
        };
        let flat = [Position::flat("BTCUSDT"), Position::flat("ETHUSDT")];
        second
            .append_phase(&flat, JournalPhase::Open, &ledger)
            .await
            .unwrap();

        let third = CsvJournal::create(dir.path(), "session").unwrap();
        let fourth = CsvJournal::create(dir.path(), "session").unwrap();

        let paths = [first.path(), second.path(), third.path(), fourth.path()];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(read_rows(first.path()).len(), 4);
        assert_eq!(read_rows(second.path()).len(), 5);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
