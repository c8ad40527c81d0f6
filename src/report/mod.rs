//! Risk reporting over the TOTAL-row equity history.
//!
//! Pure computation plus read-only market fetches; nothing here mutates the
//! ledger.

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::ledger::{equity_series, holdings_on, latest_date, LedgerStore};
use crate::market::MarketData;
use crate::Result;

/// Benchmark tickers always included in the price snapshot.
pub const BENCHMARK_TICKERS: [&str; 4] = ["^RUT", "IWO", "XBI", "^SPX"];

/// Benchmark used for the 100-based index comparison.
pub const BENCHMARK_INDEX: &str = "^SPX";

/// Trading days per year, for annualizing the ratios.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// How far back the two-day snapshot window starts, to ride out holidays.
const SNAPSHOT_LOOKBACK_DAYS: i64 = 10;

/// Simple returns and the two annualized ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStats {
    pub returns: Vec<f64>,
    pub sharpe: f64,
    pub sortino: f64,
}

/// Compute simple returns and annualized Sharpe/Sortino ratios from an
/// equity series.
///
/// Population mean and standard deviation; the Sortino downside deviation is
/// taken over negative-return periods' deviation from the full-series mean.
/// Both ratios are 0 when the series is degenerate (fewer than 2 points, zero
/// deviation, or no downside periods).
pub fn calculate_stats(series: &[f64]) -> ReturnStats {
    if series.len() < 2 {
        return ReturnStats {
            returns: Vec::new(),
            sharpe: 0.0,
            sortino: 0.0,
        };
    }

    let returns: Vec<f64> = series.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    let downside: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
    let downside_variance = downside.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / downside.len().max(1) as f64;
    let downside_std = downside_variance.sqrt();

    let annualize = TRADING_DAYS_PER_YEAR.sqrt();
    let sharpe = if std == 0.0 { 0.0 } else { mean / std * annualize };
    let sortino = if downside_std == 0.0 {
        0.0
    } else {
        mean / downside_std * annualize
    };

    ReturnStats {
        returns,
        sharpe,
        sortino,
    }
}

/// Latest price, day-over-day change, and volume for one ticker. A fetch
/// failure fills `error` instead of aborting the report.
#[derive(Debug, Clone, Serialize)]
pub struct TickerSnapshot {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TickerSnapshot {
    fn error(ticker: &str, message: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            price: None,
            change: None,
            volume: None,
            error: Some(message.into()),
        }
    }
}

/// Aggregate metrics of the equity curve.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetrics {
    #[serde(rename = "latestEquity")]
    pub latest_equity: f64,
    pub sharpe: f64,
    pub sortino: f64,
    /// Benchmark close scaled to 100 at the start of the equity series
    pub spx100: Option<f64>,
}

/// The printed JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub prices: Vec<TickerSnapshot>,
    pub metrics: ReportMetrics,
}

/// Builds the daily report from the ledger and market data.
pub struct Reporter<'a> {
    store: &'a LedgerStore,
    market: &'a dyn MarketData,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over the given store and gateway.
    pub fn new(store: &'a LedgerStore, market: &'a dyn MarketData) -> Self {
        Self { store, market }
    }

    /// Build the report, or `None` when the ledger holds no data.
    pub async fn build(&self, today: NaiveDate) -> Result<Option<ReportSummary>> {
        let rows = self.store.load()?;
        let Some(latest) = latest_date(&rows) else {
            return Ok(None);
        };

        let mut tickers: Vec<String> = holdings_on(&rows, latest)
            .into_iter()
            .map(|h| h.ticker)
            .collect();
        for benchmark in BENCHMARK_TICKERS {
            if !tickers.iter().any(|t| t == benchmark) {
                tickers.push(benchmark.to_string());
            }
        }

        let prices = join_all(
            tickers
                .iter()
                .map(|ticker| self.two_day_snapshot(ticker, today)),
        )
        .await;

        let series = equity_series(&rows);
        let equity: Vec<f64> = series.iter().map(|(_, equity)| *equity).collect();
        let stats = calculate_stats(&equity);

        let spx100 = match (series.first(), series.last()) {
            (Some((start, _)), Some((end, _))) => self.benchmark_index(*start, *end).await,
            _ => None,
        };

        Ok(Some(ReportSummary {
            prices,
            metrics: ReportMetrics {
                latest_equity: equity.last().copied().unwrap_or(0.0),
                sharpe: stats.sharpe,
                sortino: stats.sortino,
                spx100,
            },
        }))
    }

    /// Last close, day-over-day change, and volume from the trailing history
    /// window.
    async fn two_day_snapshot(&self, ticker: &str, today: NaiveDate) -> TickerSnapshot {
        let start = today - Duration::days(SNAPSHOT_LOOKBACK_DAYS);
        match self.market.history(ticker, start, today).await {
            Ok(bars) if bars.len() >= 2 => {
                let prev = &bars[bars.len() - 2];
                let curr = &bars[bars.len() - 1];
                TickerSnapshot {
                    ticker: ticker.to_string(),
                    price: Some(curr.close),
                    change: Some((curr.close - prev.close) / prev.close * 100.0),
                    volume: Some(curr.volume),
                    error: None,
                }
            }
            Ok(_) => TickerSnapshot::error(ticker, "Not enough data"),
            Err(err) => {
                debug!(ticker, %err, "snapshot fetch failed");
                TickerSnapshot::error(ticker, err.to_string())
            }
        }
    }

    /// Benchmark close over `[start, end]`, scaled so the first close is 100.
    async fn benchmark_index(&self, start: NaiveDate, end: NaiveDate) -> Option<f64> {
        match self.market.history(BENCHMARK_INDEX, start, end).await {
            Ok(bars) if !bars.is_empty() => {
                let first = bars.first()?.close;
                let last = bars.last()?.close;
                Some(100.0 * (last / first))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::market::{Bar, Quote};
    use crate::types::PortfolioRow;
    use crate::Error;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct StubMarket {
        history: HashMap<String, Vec<Bar>>,
    }

    #[async_trait]
    impl MarketData for StubMarket {
        async fn quote(&self, ticker: &str) -> crate::Result<Quote> {
            Err(Error::NoMarketData(ticker.to_string()))
        }

        async fn history(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> crate::Result<Vec<Bar>> {
            self.history
                .get(ticker)
                .cloned()
                .ok_or_else(|| Error::NoMarketData(ticker.to_string()))
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn bars(closes: &[(&str, f64, u64)]) -> Vec<Bar> {
        closes
            .iter()
            .map(|(d, close, volume)| Bar {
                date: date(d),
                close: *close,
                volume: *volume,
            })
            .collect()
    }

    #[test]
    fn test_stats_known_series() {
        let stats = calculate_stats(&[100.0, 102.0, 101.0, 105.0]);
        assert_eq!(stats.returns.len(), 3);
        assert_relative_eq!(stats.returns[0], 0.02, epsilon = 1e-12);
        assert!(stats.sharpe.is_finite());
        assert!(stats.sortino.is_finite());
        assert!(stats.sharpe > 0.0);
        assert!(stats.sortino > 0.0);
    }

    #[test]
    fn test_stats_short_series_is_zero() {
        for series in [&[][..], &[100.0][..]] {
            let stats = calculate_stats(series);
            assert!(stats.returns.is_empty());
            assert_eq!(stats.sharpe, 0.0);
            assert_eq!(stats.sortino, 0.0);
        }
    }

    #[test]
    fn test_stats_flat_series_is_zero() {
        let stats = calculate_stats(&[100.0, 100.0, 100.0]);
        assert_eq!(stats.sharpe, 0.0);
    }

    #[test]
    fn test_stats_no_downside_sortino_zero() {
        // Monotonic series: no negative returns, so no downside deviation.
        let stats = calculate_stats(&[100.0, 101.0, 103.0]);
        assert!(stats.sharpe > 0.0);
        assert_eq!(stats.sortino, 0.0);
    }

    fn seeded_reporter_rows(store: &LedgerStore) {
        let rows = vec![
            PortfolioRow::total(date("2025-06-02"), 0.0, 0.0, 100.0),
            {
                let mut held = PortfolioRow::holding(date("2025-06-03"), "ABCD", 10.0, 5.0, 4.0);
                held.total_value = Some(55.0);
                held
            },
            PortfolioRow::total(date("2025-06-03"), 55.0, 5.0, 47.0),
        ];
        store.save(&rows).unwrap();
    }

    #[tokio::test]
    async fn test_report_includes_holdings_and_benchmarks() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(&Config::new(dir.path()));
        seeded_reporter_rows(&store);

        let mut history = HashMap::new();
        history.insert(
            "ABCD".to_string(),
            bars(&[("2025-06-02", 5.0, 1000), ("2025-06-03", 5.5, 1200)]),
        );
        history.insert(
            "^SPX".to_string(),
            bars(&[("2025-06-02", 5000.0, 0), ("2025-06-03", 5100.0, 0)]),
        );
        let market = StubMarket { history };

        let report = Reporter::new(&store, &market)
            .build(date("2025-06-03"))
            .await
            .unwrap()
            .unwrap();

        // Held ticker first, then the benchmarks.
        assert_eq!(report.prices.len(), 1 + BENCHMARK_TICKERS.len());
        let abcd = &report.prices[0];
        assert_eq!(abcd.ticker, "ABCD");
        assert_eq!(abcd.price, Some(5.5));
        assert_relative_eq!(abcd.change.unwrap(), 10.0, epsilon = 1e-9);
        assert_eq!(abcd.volume, Some(1200));
        assert!(abcd.error.is_none());

        // Unstubbed benchmarks degrade to an error entry.
        let rut = report.prices.iter().find(|p| p.ticker == "^RUT").unwrap();
        assert!(rut.error.is_some());
        assert!(rut.price.is_none());

        // 100-based benchmark index: 100 * 5100/5000
        assert_relative_eq!(report.metrics.spx100.unwrap(), 102.0, epsilon = 1e-9);
        assert_eq!(report.metrics.latest_equity, 102.0);
    }

    #[tokio::test]
    async fn test_report_empty_ledger_is_none() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(&Config::new(dir.path()));
        let market = StubMarket {
            history: HashMap::new(),
        };

        let report = Reporter::new(&store, &market)
            .build(date("2025-06-03"))
            .await
            .unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_single_bar_reports_not_enough_data() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::new(&Config::new(dir.path()));
        seeded_reporter_rows(&store);

        let mut history = HashMap::new();
        history.insert("ABCD".to_string(), bars(&[("2025-06-03", 5.5, 1200)]));
        let market = StubMarket { history };

        let report = Reporter::new(&store, &market)
            .build(date("2025-06-03"))
            .await
            .unwrap()
            .unwrap();
        let abcd = &report.prices[0];
        assert_eq!(abcd.error.as_deref(), Some("Not enough data"));
    }

    #[test]
    fn test_summary_serializes_expected_shape() {
        let summary = ReportSummary {
            prices: vec![TickerSnapshot::error("ABCD", "Not enough data")],
            metrics: ReportMetrics {
                latest_equity: 102.0,
                sharpe: 1.5,
                sortino: 0.0,
                spx100: None,
            },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["latestEquity"], 102.0);
        assert_eq!(json["metrics"]["spx100"], serde_json::Value::Null);
        assert_eq!(json["prices"][0]["ticker"], "ABCD");
        assert!(json["prices"][0].get("price").is_none());
    }
}
