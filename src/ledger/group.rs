//! Date-group operations over snapshot rows.
//!
//! A date-group is the contiguous run of rows sharing one date, terminated by
//! its TOTAL sentinel row. The latest group is always the tail of the file.

use chrono::NaiveDate;

use crate::types::{round2, Holding, PortfolioRow, ACTION_STOP_LOSS};

/// Latest date present in the ledger.
pub fn latest_date(rows: &[PortfolioRow]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.date).max()
}

/// All rows for one date.
pub fn date_group(rows: &[PortfolioRow], date: NaiveDate) -> Vec<PortfolioRow> {
    rows.iter().filter(|r| r.date == date).cloned().collect()
}

/// Index of the first row of `date`'s group, if the group exists.
pub fn group_start(rows: &[PortfolioRow], date: NaiveDate) -> Option<usize> {
    rows.iter().position(|r| r.date == date)
}

/// Holdings still open on one date. Rows marked with the stop-loss action
/// record an exit, not a position, so they are never carried forward; NO DATA
/// rows are (the position is intact, only the quote was missing).
pub fn holdings_on(rows: &[PortfolioRow], date: NaiveDate) -> Vec<Holding> {
    rows.iter()
        .filter(|r| r.date == date && !r.is_total() && r.action != ACTION_STOP_LOSS)
        .map(Holding::from_row)
        .collect()
}

/// Cash balance carried by the TOTAL row of one date, zero when absent.
pub fn cash_on(rows: &[PortfolioRow], date: NaiveDate) -> f64 {
    rows.iter()
        .find(|r| r.date == date && r.is_total())
        .and_then(|r| r.cash_balance)
        .unwrap_or(0.0)
}

/// The TOTAL-row equity time series, ordered by date.
pub fn equity_series(rows: &[PortfolioRow]) -> Vec<(NaiveDate, f64)> {
    let mut series: Vec<(NaiveDate, f64)> = rows
        .iter()
        .filter(|r| r.is_total())
        .map(|r| (r.date, r.total_equity.unwrap_or(0.0)))
        .collect();
    series.sort_by_key(|(date, _)| *date);
    series
}

/// Drop any existing rows for `date` and append `group` in their place.
/// Running the daily processor twice on the same day is idempotent because of
/// this replacement.
pub fn replace_date(rows: &mut Vec<PortfolioRow>, date: NaiveDate, group: Vec<PortfolioRow>) {
    rows.retain(|r| r.date != date);
    rows.extend(group);
}

/// Duplicate the latest date-group under `today` when the ledger is stale, so
/// every trading day has its own snapshot lineage even without an automated
/// run in between. Returns whether a rollover happened.
pub fn roll_forward(rows: &mut Vec<PortfolioRow>, today: NaiveDate) -> bool {
    let Some(latest) = latest_date(rows) else {
        return false;
    };
    if latest == today {
        return false;
    }

    let rolled: Vec<PortfolioRow> = rows
        .iter()
        .filter(|r| r.date == latest)
        .cloned()
        .map(|mut r| {
            r.date = today;
            r
        })
        .collect();
    rows.extend(rolled);
    true
}

/// Recompute the TOTAL row of a group from its holding rows and the given
/// cash balance. Cash is settled first by the caller; totals always derive
/// from the row values (the canonical recompute order for both trade paths).
/// Stop-loss exit rows are excluded the same way [`holdings_on`] excludes
/// them: their proceeds already live in cash, so counting their value would
/// double the sold position in equity.
pub fn recompute_total(group: &mut [PortfolioRow], cash: f64) {
    let mut total_value = 0.0;
    let mut total_pnl = 0.0;
    for row in group
        .iter()
        .filter(|r| !r.is_total() && r.action != ACTION_STOP_LOSS)
    {
        total_value += row.total_value.unwrap_or(0.0);
        total_pnl += row.pnl.unwrap_or(0.0);
    }

    if let Some(total) = group.iter_mut().find(|r| r.is_total()) {
        total.total_value = Some(round2(total_value));
        total.pnl = Some(round2(total_pnl));
        total.cash_balance = Some(round2(cash));
        total.total_equity = Some(round2(cash + total_value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_rows() -> Vec<PortfolioRow> {
        let mut rows = Vec::new();
        let d1 = date("2025-06-02");
        let mut held = PortfolioRow::holding(d1, "ABCD", 10.0, 5.0, 4.0);
        held.current_price = Some(5.5);
        held.total_value = Some(55.0);
        held.pnl = Some(5.0);
        rows.push(held);
        rows.push(PortfolioRow::total(d1, 55.0, 5.0, 100.0));

        let d2 = date("2025-06-03");
        let mut held = PortfolioRow::holding(d2, "ABCD", 10.0, 5.0, 4.0);
        held.current_price = Some(6.0);
        held.total_value = Some(60.0);
        held.pnl = Some(10.0);
        rows.push(held);
        rows.push(PortfolioRow::total(d2, 60.0, 10.0, 100.0));
        rows
    }

    #[test]
    fn test_latest_date() {
        assert_eq!(latest_date(&sample_rows()), Some(date("2025-06-03")));
        assert_eq!(latest_date(&[]), None);
    }

    #[test]
    fn test_holdings_and_cash_on() {
        let rows = sample_rows();
        let holdings = holdings_on(&rows, date("2025-06-03"));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "ABCD");
        assert_eq!(holdings[0].shares, 10.0);
        assert_eq!(cash_on(&rows, date("2025-06-03")), 100.0);
        assert_eq!(cash_on(&rows, date("2025-06-04")), 0.0);
    }

    #[test]
    fn test_holdings_on_skips_stop_loss_exits() {
        let mut rows = sample_rows();
        let mut exited = PortfolioRow::holding(date("2025-06-03"), "WXYZ", 4.0, 20.0, 15.0);
        exited.action = ACTION_STOP_LOSS.to_string();
        rows.insert(3, exited);
        let mut degraded = PortfolioRow::holding(date("2025-06-03"), "QRST", 2.0, 9.0, 5.0);
        degraded.action = crate::types::ACTION_NO_DATA.to_string();
        rows.insert(4, degraded);

        let holdings = holdings_on(&rows, date("2025-06-03"));
        let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["ABCD", "QRST"]);
    }

    #[test]
    fn test_equity_series_sorted() {
        let mut rows = sample_rows();
        rows.rotate_left(2); // scramble stored order
        let series = equity_series(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], (date("2025-06-02"), 155.0));
        assert_eq!(series[1], (date("2025-06-03"), 160.0));
    }

    #[test]
    fn test_replace_date_is_idempotent() {
        let mut rows = sample_rows();
        let group = date_group(&rows, date("2025-06-03"));
        let before = rows.clone();
        replace_date(&mut rows, date("2025-06-03"), group);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_roll_forward_duplicates_latest_group() {
        let mut rows = sample_rows();
        assert!(roll_forward(&mut rows, date("2025-06-04")));
        assert_eq!(rows.len(), 6);
        let holdings = holdings_on(&rows, date("2025-06-04"));
        assert_eq!(holdings.len(), 1);
        assert_eq!(cash_on(&rows, date("2025-06-04")), 100.0);

        // Already current: nothing to do.
        assert!(!roll_forward(&mut rows, date("2025-06-04")));
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_recompute_total_skips_stop_loss_exits() {
        let mut group = date_group(&sample_rows(), date("2025-06-03"));
        let mut exited = PortfolioRow::holding(date("2025-06-03"), "WXYZ", 4.0, 20.0, 15.0);
        exited.action = ACTION_STOP_LOSS.to_string();
        exited.current_price = Some(15.0);
        exited.total_value = Some(60.0);
        exited.pnl = Some(-20.0);
        group.insert(1, exited);

        // Exit proceeds are already in cash; the row must not count again.
        recompute_total(&mut group, 160.0);
        let total = group.iter().find(|r| r.is_total()).unwrap();
        assert_eq!(total.total_value, Some(60.0));
        assert_eq!(total.pnl, Some(10.0));
        assert_eq!(total.total_equity, Some(220.0));
    }

    #[test]
    fn test_recompute_total_conserves_equity() {
        let mut group = date_group(&sample_rows(), date("2025-06-03"));
        group[0].total_value = Some(62.5);
        group[0].pnl = Some(12.5);
        recompute_total(&mut group, 37.5);

        let total = group.iter().find(|r| r.is_total()).unwrap();
        assert_eq!(total.total_value, Some(62.5));
        assert_eq!(total.pnl, Some(12.5));
        assert_eq!(total.cash_balance, Some(37.5));
        assert_eq!(total.total_equity, Some(100.0));
        let drift = total.cash_balance.unwrap() + total.total_value.unwrap()
            - total.total_equity.unwrap();
        assert!(drift.abs() < 0.01);
    }
}
