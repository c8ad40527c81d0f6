//! Flat-file ledger: the portfolio snapshot history and the trade log.
//!
//! The store is the sole source of truth; every run is read-modify-append
//! with nothing kept in memory between invocations.

mod group;
mod store;

pub use group::{
    cash_on, date_group, equity_series, group_start, holdings_on, latest_date, recompute_total,
    replace_date, roll_forward,
};
pub use store::LedgerStore;
