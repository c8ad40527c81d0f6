//! CSV-backed persistence for the snapshot ledger and trade log.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;
use crate::types::{PortfolioRow, TradeLogRow};
use crate::Result;

/// Store for the two ledger files.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    portfolio_path: PathBuf,
    trade_log_path: PathBuf,
}

impl LedgerStore {
    /// Create a store for the paths in `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            portfolio_path: config.portfolio_path(),
            trade_log_path: config.trade_log_path(),
        }
    }

    /// Path of the snapshot file.
    pub fn portfolio_path(&self) -> &PathBuf {
        &self.portfolio_path
    }

    /// Load all snapshot rows. A missing file reads as an empty ledger.
    pub fn load(&self) -> Result<Vec<PortfolioRow>> {
        if !self.portfolio_path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.portfolio_path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        debug!(rows = rows.len(), "loaded portfolio snapshot");
        Ok(rows)
    }

    /// Overwrite the snapshot file with `rows`, atomically.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target so a failed run never leaves a half-written ledger.
    pub fn save(&self, rows: &[PortfolioRow]) -> Result<()> {
        if let Some(parent) = self.portfolio_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.portfolio_path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.portfolio_path)?;
        debug!(rows = rows.len(), "saved portfolio snapshot");
        Ok(())
    }

    /// Append one line to the trade log, writing the header only when the
    /// file does not exist yet.
    pub fn append_trade(&self, row: &TradeLogRow) -> Result<()> {
        if let Some(parent) = self.trade_log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let is_new = !self.trade_log_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.trade_log_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Load the full trade log, tolerating a missing file as empty.
    pub fn load_trades(&self) -> Result<Vec<TradeLogRow>> {
        if !self.trade_log_path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.trade_log_path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortfolioRow;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn temp_store() -> (tempfile::TempDir, LedgerStore) {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(&Config::new(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, store) = temp_store();

        let mut rows = vec![PortfolioRow::holding(date("2025-06-02"), "ABCD", 10.0, 5.0, 4.0)];
        rows.push(PortfolioRow::total(date("2025-06-02"), 55.0, 5.0, 100.0));
        store.save(&rows).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_save_preserves_blank_fields() {
        let (_dir, store) = temp_store();

        let mut row = PortfolioRow::holding(date("2025-06-02"), "ABCD", 10.0, 5.0, 4.0);
        row.action = "NO DATA".to_string();
        store.save(&[row.clone()]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].current_price, None);
        assert_eq!(loaded[0].action, "NO DATA");
    }

    #[test]
    fn test_append_trade_writes_header_once() {
        let (dir, store) = temp_store();

        let first = crate::types::TradeLogRow::buy(date("2025-06-02"), "ABCD", 10.0, 5.0, 50.0, "entry");
        let second = crate::types::TradeLogRow::sell(date("2025-06-03"), "ABCD", 5.0, 6.0, 25.0, 5.0, "trim");
        store.append_trade(&first).unwrap();
        store.append_trade(&second).unwrap();

        let text = std::fs::read_to_string(dir.path().join("trade_log.csv")).unwrap();
        assert_eq!(text.matches("Shares Bought").count(), 1);

        let trades = store.load_trades().unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0], first);
        assert_eq!(trades[1], second);
    }

    #[test]
    fn test_save_is_atomic_replacement() {
        let (dir, store) = temp_store();

        store
            .save(&[PortfolioRow::total(date("2025-06-02"), 0.0, 0.0, 100.0)])
            .unwrap();
        store
            .save(&[PortfolioRow::total(date("2025-06-03"), 0.0, 0.0, 100.0)])
            .unwrap();

        // No temp file left behind, and the content is the second write only.
        assert!(!dir.path().join("portfolio.csv.tmp").exists());
        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date("2025-06-03"));
    }
}
