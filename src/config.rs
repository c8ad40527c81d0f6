//! Configuration for file locations.
//!
//! The data directory is an explicit value handed to each component at
//! construction time; nothing reads it from global mutable state.

use std::env;
use std::path::{Path, PathBuf};

/// File-location configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the snapshot and trade-log files
    pub data_dir: PathBuf,
}

impl Config {
    /// Create a config rooted at the given data directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Resolve the data directory: CLI override, then the
    /// `PAPERFOLIO_DATA_DIR` environment variable, then the default.
    pub fn resolve(cli_dir: Option<PathBuf>) -> Self {
        let data_dir = cli_dir
            .or_else(|| env::var("PAPERFOLIO_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    /// Default data directory: `~/.paperfolio`.
    pub fn default_data_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".paperfolio"))
            .unwrap_or_else(|| PathBuf::from(".paperfolio"))
    }

    /// Path of the portfolio snapshot file.
    pub fn portfolio_path(&self) -> PathBuf {
        self.data_dir.join("portfolio.csv")
    }

    /// Path of the trade log file.
    pub fn trade_log_path(&self) -> PathBuf {
        self.data_dir.join("trade_log.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_data_dir() {
        let config = Config::new("/tmp/folio");
        assert_eq!(config.portfolio_path(), PathBuf::from("/tmp/folio/portfolio.csv"));
        assert_eq!(config.trade_log_path(), PathBuf::from("/tmp/folio/trade_log.csv"));
    }

    #[test]
    fn test_resolve_prefers_cli_dir() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/explicit")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/explicit"));
    }
}
