//! Manual trade recording against the latest date-group.
//!
//! Buys and sells entered by the user outside the daily cycle. The recorder
//! operates on the same snapshot rows and store as the daily processor;
//! validation failures reject the operation before anything is written.

use chrono::NaiveDate;
use tracing::info;

use crate::ledger::{group_start, recompute_total, roll_forward, LedgerStore};
use crate::prompt::Prompt;
use crate::types::{round2, PortfolioRow, TradeLogRow, ACTION_HOLD, ACTION_STOP_LOSS};
use crate::{Error, Result};

/// A validated manual trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Shares to buy or sell (> 0)
    pub shares: f64,
    /// Execution price per share
    pub price: f64,
    /// New stop-loss threshold for the holding
    pub stop_loss: f64,
    /// Free-text reason recorded in the trade log
    pub reason: String,
}

/// Trade direction chosen in the interactive flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Applies manual trades to the ledger.
pub struct ManualRecorder<'a> {
    store: &'a LedgerStore,
}

impl<'a> ManualRecorder<'a> {
    /// Create a recorder over the given store.
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    /// Record a buy against today's date-group.
    ///
    /// Rejects with [`Error::InsufficientCash`] when shares * price exceeds
    /// the available cash, leaving the ledger untouched. An existing holding
    /// is merged with a weighted-average cost basis; otherwise a new row is
    /// inserted before the TOTAL row.
    pub fn buy(&self, today: NaiveDate, request: &TradeRequest) -> Result<()> {
        let (mut rows, mut group, total_idx) = self.today_group(today)?;

        let ticker = request.ticker.to_uppercase();
        let cash = group[total_idx].cash_balance.unwrap_or(0.0);
        let cost = request.shares * request.price;
        if cost > cash {
            return Err(Error::InsufficientCash {
                needed: cost,
                available: cash,
            });
        }

        // An exit row for the same ticker records a closed position; a
        // buy-back opens a fresh row instead of reviving it.
        match group[..total_idx]
            .iter()
            .position(|r| r.ticker == ticker && r.action != ACTION_STOP_LOSS)
        {
            Some(idx) => {
                let row = &mut group[idx];
                let old_shares = row.shares.unwrap_or(0.0);
                let old_basis = row.cost_basis.unwrap_or(0.0);
                let new_shares = old_shares + request.shares;
                let new_basis = round2((old_basis * old_shares + cost) / new_shares);

                row.shares = Some(new_shares);
                row.cost_basis = Some(new_basis);
                row.stop_loss = Some(request.stop_loss);
                row.current_price = Some(request.price);
                row.total_value = Some(round2(new_shares * request.price));
                row.pnl = Some(round2((request.price - new_basis) * new_shares));
                row.action = ACTION_HOLD.to_string();
            }
            None => {
                let mut row = PortfolioRow::holding(
                    today,
                    &request.ticker,
                    request.shares,
                    request.price,
                    request.stop_loss,
                );
                row.current_price = Some(request.price);
                row.total_value = Some(round2(request.shares * request.price));
                row.pnl = Some(0.0);
                row.action = ACTION_HOLD.to_string();
                group.insert(total_idx, row);
            }
        }

        // Canonical order: settle cash first, then recompute totals from rows.
        recompute_total(&mut group, cash - cost);
        rows.extend(group);
        self.store.save(&rows)?;
        self.store.append_trade(&TradeLogRow::buy(
            today,
            &request.ticker,
            request.shares,
            request.price,
            cost,
            &request.reason,
        ))?;

        info!(ticker = %request.ticker, shares = request.shares, price = request.price, "manual buy recorded");
        Ok(())
    }

    /// Record a sell against today's date-group.
    ///
    /// Rejects unknown tickers and oversized orders without touching the
    /// ledger. Realized P&L is (price - average cost) * shares sold; a fully
    /// sold holding is removed from the group.
    pub fn sell(&self, today: NaiveDate, request: &TradeRequest) -> Result<()> {
        let (mut rows, mut group, total_idx) = self.today_group(today)?;

        let ticker = request.ticker.to_uppercase();
        let idx = group[..total_idx]
            .iter()
            .position(|r| r.ticker == ticker && r.action != ACTION_STOP_LOSS)
            .ok_or_else(|| Error::TickerNotHeld(ticker.clone()))?;

        let held = group[idx].shares.unwrap_or(0.0);
        if request.shares > held {
            return Err(Error::InsufficientShares {
                requested: request.shares,
                held,
            });
        }

        let avg_cost = group[idx].cost_basis.unwrap_or(0.0);
        let proceeds = request.shares * request.price;
        let cost = request.shares * avg_cost;
        let pnl = proceeds - cost;
        let new_shares = held - request.shares;

        if new_shares > 0.0 {
            let row = &mut group[idx];
            row.shares = Some(new_shares);
            row.stop_loss = Some(request.stop_loss);
            row.current_price = Some(request.price);
            row.total_value = Some(round2(new_shares * request.price));
            row.pnl = Some(round2((request.price - avg_cost) * new_shares));
            row.action = ACTION_HOLD.to_string();
        } else {
            group.remove(idx);
        }

        let cash = group
            .iter()
            .find(|r| r.is_total())
            .and_then(|r| r.cash_balance)
            .unwrap_or(0.0);
        recompute_total(&mut group, cash + proceeds);
        rows.extend(group);
        self.store.save(&rows)?;
        self.store.append_trade(&TradeLogRow::sell(
            today,
            &request.ticker,
            request.shares,
            request.price,
            cost,
            pnl,
            &request.reason,
        ))?;

        info!(ticker = %request.ticker, shares = request.shares, price = request.price, pnl = round2(pnl), "manual sell recorded");
        Ok(())
    }

    /// Load the ledger and split off today's group, rolling the latest group
    /// forward to today first when the ledger is stale.
    fn today_group(&self, today: NaiveDate) -> Result<(Vec<PortfolioRow>, Vec<PortfolioRow>, usize)> {
        let mut rows = self.store.load()?;
        if rows.is_empty() {
            return Err(Error::InvalidOperation(
                "no portfolio data; run the daily update first".to_string(),
            ));
        }

        roll_forward(&mut rows, today);
        let start = group_start(&rows, today).ok_or_else(|| {
            Error::InvalidOperation(format!("ledger has no rows dated {today}"))
        })?;
        let group = rows.split_off(start);
        let total_idx = group
            .iter()
            .position(|r| r.is_total())
            .ok_or_else(|| Error::InvalidOperation("date-group has no TOTAL row".to_string()))?;
        Ok((rows, group, total_idx))
    }
}

/// Interactively collect a trade side and request, re-asking on invalid input.
pub fn prompt_trade(prompt: &mut dyn Prompt) -> Result<(TradeSide, TradeRequest)> {
    let side = loop {
        let answer = prompt.line("Action [buy/sell]: ")?;
        match answer.trim().to_lowercase().as_str() {
            "buy" | "b" => break TradeSide::Buy,
            "sell" | "s" => break TradeSide::Sell,
            _ => continue,
        }
    };

    let ticker = loop {
        let answer = prompt.line("Ticker: ")?.trim().to_uppercase();
        if !answer.is_empty() && answer.chars().all(|c| c.is_ascii_uppercase()) {
            break answer;
        }
    };
    let shares = prompt_number(prompt, "Shares", |v| v > 0.0)?;
    let price = prompt_number(prompt, "Price", |v| v >= 0.0)?;
    let stop_loss = prompt_number(prompt, "Stop loss", |v| v >= 0.0)?;
    let reason = prompt.line("Reason: ")?;

    Ok((
        side,
        TradeRequest {
            ticker,
            shares,
            price,
            stop_loss,
            reason,
        },
    ))
}

fn prompt_number(
    prompt: &mut dyn Prompt,
    label: &str,
    valid: impl Fn(f64) -> bool,
) -> Result<f64> {
    loop {
        let answer = prompt.line(&format!("{label}: "))?;
        if let Ok(value) = answer.trim().parse::<f64>() {
            if valid(value) {
                return Ok(value);
            }
        }
    }
}

/// Run the full interactive manual-entry flow.
///
/// Business-rule rejections (insufficient cash or shares, unknown ticker) are
/// reported and leave the ledger unchanged; they are not fatal.
pub fn run(store: &LedgerStore, prompt: &mut dyn Prompt, today: NaiveDate) -> Result<()> {
    let (side, request) = prompt_trade(prompt)?;
    let recorder = ManualRecorder::new(store);
    let result = match side {
        TradeSide::Buy => recorder.buy(today, &request),
        TradeSide::Sell => recorder.sell(today, &request),
    };

    match result {
        Ok(()) => {
            println!(
                "Manual {} logged.",
                if side == TradeSide::Buy { "buy" } else { "sell" }
            );
            Ok(())
        }
        Err(
            err @ (Error::InsufficientCash { .. }
            | Error::InsufficientShares { .. }
            | Error::TickerNotHeld(_)),
        ) => {
            println!("Rejected: {err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
