//! Core data types shared by the ledger, daily processor, and manual recorder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel ticker marking the aggregate row that terminates a date-group.
pub const TOTAL_TICKER: &str = "TOTAL";

/// Action recorded for a holding that was kept.
pub const ACTION_HOLD: &str = "HOLD";
/// Action recorded when no usable quote was available.
pub const ACTION_NO_DATA: &str = "NO DATA";
/// Action recorded for a stop-loss forced sale.
pub const ACTION_STOP_LOSS: &str = "SELL - Stop Loss Triggered";
/// Trade-log reason tag for stop-loss forced sales.
pub const REASON_STOP_LOSS: &str = "AUTOMATED SELL - STOPLOSS TRIGGERED";

/// Round a monetary value to 2 decimals using standard rounding.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One row of the portfolio snapshot file.
///
/// Per-ticker rows leave the aggregate-only fields (`cash_balance`,
/// `total_equity`) blank; the TOTAL sentinel row leaves the per-ticker fields
/// blank. Blank CSV fields map to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Shares")]
    pub shares: Option<f64>,
    #[serde(rename = "Cost Basis")]
    pub cost_basis: Option<f64>,
    #[serde(rename = "Stop Loss")]
    pub stop_loss: Option<f64>,
    #[serde(rename = "Current Price")]
    pub current_price: Option<f64>,
    #[serde(rename = "Total Value")]
    pub total_value: Option<f64>,
    #[serde(rename = "PnL")]
    pub pnl: Option<f64>,
    #[serde(rename = "Action", default)]
    pub action: String,
    #[serde(rename = "Cash Balance")]
    pub cash_balance: Option<f64>,
    #[serde(rename = "Total Equity")]
    pub total_equity: Option<f64>,
}

impl PortfolioRow {
    /// Create a per-ticker row with the aggregate fields blank.
    pub fn holding(date: NaiveDate, ticker: &str, shares: f64, cost_basis: f64, stop_loss: f64) -> Self {
        Self {
            date,
            ticker: ticker.to_uppercase(),
            shares: Some(shares),
            cost_basis: Some(cost_basis),
            stop_loss: Some(stop_loss),
            current_price: None,
            total_value: None,
            pnl: None,
            action: String::new(),
            cash_balance: None,
            total_equity: None,
        }
    }

    /// Create the TOTAL sentinel row for a date-group.
    pub fn total(date: NaiveDate, total_value: f64, pnl: f64, cash: f64) -> Self {
        Self {
            date,
            ticker: TOTAL_TICKER.to_string(),
            shares: None,
            cost_basis: None,
            stop_loss: None,
            current_price: None,
            total_value: Some(round2(total_value)),
            pnl: Some(round2(pnl)),
            action: String::new(),
            cash_balance: Some(round2(cash)),
            total_equity: Some(round2(cash + total_value)),
        }
    }

    /// Whether this is the aggregate sentinel row.
    pub fn is_total(&self) -> bool {
        self.ticker == TOTAL_TICKER
    }
}

/// A held position extracted from the latest date-group.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Number of shares owned
    pub shares: f64,
    /// Average cost per share
    pub cost_basis: f64,
    /// Price threshold triggering an automatic forced sale
    pub stop_loss: f64,
}

impl Holding {
    /// Create a new holding.
    pub fn new(ticker: &str, shares: f64, cost_basis: f64, stop_loss: f64) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            shares,
            cost_basis,
            stop_loss,
        }
    }

    /// Extract a holding from a per-ticker snapshot row. Blank numeric fields
    /// read as zero, matching how the snapshot file has always been consumed.
    pub fn from_row(row: &PortfolioRow) -> Self {
        Self {
            ticker: row.ticker.clone(),
            shares: row.shares.unwrap_or(0.0),
            cost_basis: row.cost_basis.unwrap_or(0.0),
            stop_loss: row.stop_loss.unwrap_or(0.0),
        }
    }
}

/// One append-only line of the trade log.
///
/// Buys fill the `bought` columns, sells fill the `sold` columns; the unused
/// side stays blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Shares Bought")]
    pub shares_bought: Option<f64>,
    #[serde(rename = "Buy Price")]
    pub buy_price: Option<f64>,
    #[serde(rename = "Cost Basis")]
    pub cost_basis: Option<f64>,
    #[serde(rename = "PnL")]
    pub pnl: Option<f64>,
    #[serde(rename = "Reason", default)]
    pub reason: String,
    #[serde(rename = "Shares Sold")]
    pub shares_sold: Option<f64>,
    #[serde(rename = "Sell Price")]
    pub sell_price: Option<f64>,
}

impl TradeLogRow {
    /// Log line for a buy.
    pub fn buy(date: NaiveDate, ticker: &str, shares: f64, price: f64, cost: f64, reason: &str) -> Self {
        Self {
            date,
            ticker: ticker.to_uppercase(),
            shares_bought: Some(shares),
            buy_price: Some(price),
            cost_basis: Some(round2(cost)),
            pnl: Some(0.0),
            reason: reason.to_string(),
            shares_sold: None,
            sell_price: None,
        }
    }

    /// Log line for a sell.
    pub fn sell(
        date: NaiveDate,
        ticker: &str,
        shares: f64,
        price: f64,
        cost_basis: f64,
        pnl: f64,
        reason: &str,
    ) -> Self {
        Self {
            date,
            ticker: ticker.to_uppercase(),
            shares_bought: None,
            buy_price: None,
            cost_basis: Some(round2(cost_basis)),
            pnl: Some(round2(pnl)),
            reason: reason.to_string(),
            shares_sold: Some(shares),
            sell_price: Some(price),
        }
    }
}
