//! Paperfolio - Daily paper-trading portfolio tracker.
//!
//! This crate tracks a simulated stock portfolio backed by two flat CSV files:
//!
//! - **Daily processing**: fetch latest quotes, reprice holdings, realize
//!   stop-loss exits, and append a new date-group to the snapshot ledger
//! - **Manual trades**: record user-entered buys and sells against the
//!   latest date-group
//! - **Reporting**: Sharpe/Sortino ratios of the equity curve plus two-day
//!   price snapshots against benchmark indices
//!
//! # Example
//!
//! ```rust,no_run
//! use paperfolio::config::Config;
//! use paperfolio::daily::DailyProcessor;
//! use paperfolio::ledger::LedgerStore;
//! use paperfolio::market::YahooGateway;
//!
//! # async fn run() -> paperfolio::Result<()> {
//! let config = Config::new("./data");
//! let store = LedgerStore::new(&config);
//! let market = YahooGateway::new();
//!
//! let processor = DailyProcessor::new(&store, &market);
//! let outcome = processor.run(chrono::Utc::now().date_naive(), None, None).await?;
//! println!("cash after run: {:.2}", outcome.cash);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod daily;
pub mod ledger;
pub mod manual;
pub mod market;
pub mod prompt;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use daily::{DailyOutcome, DailyProcessor};
pub use ledger::LedgerStore;
pub use manual::{ManualRecorder, TradeRequest};
pub use market::{Bar, MarketData, Quote, YahooGateway};
pub use prompt::{Prompt, ScriptedPrompt, StdinPrompt};
pub use report::{calculate_stats, ReportSummary, Reporter, ReturnStats};
pub use types::{Holding, PortfolioRow, TradeLogRow};

/// Error types for paperfolio operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No market data for {0}")]
    NoMarketData(String),

    #[error("Ticker not held: {0}")]
    TickerNotHeld(String),

    #[error("Insufficient cash: need ${needed:.2}, have ${available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("Insufficient shares: tried to sell {requested}, holding {held}")]
    InsufficientShares { requested: f64, held: f64 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Aborted: {0}")]
    Aborted(String),
}

/// Result type for paperfolio operations.
pub type Result<T> = std::result::Result<T, Error>;
