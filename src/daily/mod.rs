//! Daily portfolio state transition.
//!
//! Once per trading day: fetch quotes for every holding, reprice, realize
//! stop-loss exits into cash, and replace today's date-group in the snapshot
//! ledger with the recomputed one.

use chrono::{Datelike, NaiveDate, Weekday};
use futures::future::join_all;
use tracing::{info, warn};

use crate::ledger::{cash_on, holdings_on, latest_date, replace_date, LedgerStore};
use crate::market::MarketData;
use crate::prompt::Prompt;
use crate::types::{
    round2, Holding, PortfolioRow, TradeLogRow, ACTION_HOLD, ACTION_NO_DATA, ACTION_STOP_LOSS,
    REASON_STOP_LOSS,
};
use crate::{Error, Result};

/// Holdings and cash carried out of a daily run.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyOutcome {
    /// Holdings carried forward (stop-loss exits removed)
    pub holdings: Vec<Holding>,
    /// Cash balance after realized stop-loss proceeds
    pub cash: f64,
}

/// Runs the once-per-day processing cycle against a ledger store and a
/// market-data gateway.
pub struct DailyProcessor<'a> {
    store: &'a LedgerStore,
    market: &'a dyn MarketData,
}

impl<'a> DailyProcessor<'a> {
    /// Create a processor over the given store and gateway.
    pub fn new(store: &'a LedgerStore, market: &'a dyn MarketData) -> Self {
        Self { store, market }
    }

    /// Run the daily cycle for `today`.
    ///
    /// `starting_cash` overrides the cash balance read from the ledger.
    /// When `prompt` is provided and `today` falls on a weekend, the user is
    /// asked to confirm before prices from the last trading day are saved
    /// under today's date; declining aborts the run. Re-running on the same
    /// day replaces today's date-group, so the operation is idempotent.
    pub async fn run(
        &self,
        today: NaiveDate,
        starting_cash: Option<f64>,
        mut prompt: Option<&mut dyn Prompt>,
    ) -> Result<DailyOutcome> {
        let mut rows = self.store.load()?;
        let (holdings, ledger_cash) = match latest_date(&rows) {
            Some(latest) => (holdings_on(&rows, latest), cash_on(&rows, latest)),
            None => (Vec::new(), 0.0),
        };
        let mut cash = starting_cash.unwrap_or(ledger_cash);

        if is_weekend(today) {
            if let Some(prompt) = prompt.as_deref_mut() {
                let proceed = prompt.confirm(
                    "Markets are closed on weekends. Quotes will repeat the last trading day \
                     and be saved under today's date. Continue?",
                )?;
                if !proceed {
                    return Err(Error::Aborted("weekend run declined".to_string()));
                }
            }
        }

        // Independent tickers: fire all quote requests and collect before use.
        let quotes = join_all(holdings.iter().map(|h| self.market.quote(&h.ticker))).await;

        let mut group = Vec::with_capacity(holdings.len() + 1);
        let mut trade_entries = Vec::new();
        let mut remaining = Vec::new();
        let mut total_value = 0.0;
        let mut total_pnl = 0.0;

        for (holding, quote) in holdings.iter().zip(quotes) {
            let price = match quote {
                Ok(q) if q.price.is_finite() && q.price > 0.0 => Some(round2(q.price)),
                Ok(_) => None,
                Err(err) => {
                    warn!(ticker = %holding.ticker, %err, "quote fetch failed");
                    None
                }
            };

            let mut row = PortfolioRow::holding(
                today,
                &holding.ticker,
                holding.shares,
                holding.cost_basis,
                holding.stop_loss,
            );

            let Some(price) = price else {
                // Degraded ticker: blank computed fields, excluded from
                // totals, but the holding itself is carried forward.
                row.action = ACTION_NO_DATA.to_string();
                group.push(row);
                remaining.push(holding.clone());
                continue;
            };

            let value = round2(price * holding.shares);
            let pnl = round2((price - holding.cost_basis) * holding.shares);
            row.current_price = Some(price);
            row.total_value = Some(value);
            row.pnl = Some(pnl);

            if price <= holding.stop_loss {
                row.action = ACTION_STOP_LOSS.to_string();
                cash += value;
                info!(ticker = %holding.ticker, price, stop = holding.stop_loss, "stop loss triggered");
                trade_entries.push(TradeLogRow::sell(
                    today,
                    &holding.ticker,
                    holding.shares,
                    price,
                    holding.cost_basis,
                    pnl,
                    REASON_STOP_LOSS,
                ));
            } else {
                row.action = ACTION_HOLD.to_string();
                total_value += value;
                total_pnl += pnl;
                remaining.push(holding.clone());
            }
            group.push(row);
        }

        group.push(PortfolioRow::total(today, total_value, total_pnl, cash));

        for entry in &trade_entries {
            self.store.append_trade(entry)?;
        }
        replace_date(&mut rows, today, group);
        self.store.save(&rows)?;

        info!(
            %today,
            holdings = remaining.len(),
            cash = round2(cash),
            "daily processing complete"
        );
        Ok(DailyOutcome {
            holdings: remaining,
            cash,
        })
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
