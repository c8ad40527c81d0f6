//! Market-data gateway.
//!
//! External collaborator behind a trait so the daily processor and reporter
//! can be driven by a stub in tests.

mod yahoo;

pub use yahoo::YahooGateway;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::Result;

/// Latest quote for a ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Regular-market price
    pub price: f64,
}

/// One daily bar of price history.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

/// Market-data source.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest quote for `ticker`.
    async fn quote(&self, ticker: &str) -> Result<Quote>;

    /// Daily closes for `ticker` over `[start, end]`, oldest first.
    async fn history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>>;
}
