//! Yahoo Finance gateway over the v8 chart endpoint.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Bar, MarketData, Quote};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Market-data gateway backed by Yahoo Finance.
#[derive(Debug, Clone)]
pub struct YahooGateway {
    base_url: String,
    client: Client,
}

impl YahooGateway {
    /// Create a gateway against the public Yahoo endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a gateway against a custom base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        // Yahoo rejects requests without a browser-like user agent.
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; paperfolio)")
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn chart(&self, ticker: &str, query: &[(&str, String)]) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        debug!(ticker, "fetching chart data");

        let response = self.client.get(&url).query(query).send().await?;
        let body: ChartResponse = response.error_for_status()?.json().await?;

        body.chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| Error::NoMarketData(ticker.to_string()))
    }
}

impl Default for YahooGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for YahooGateway {
    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let result = self
            .chart(ticker, &[("interval", "1d".to_string()), ("range", "1d".to_string())])
            .await?;

        let price = result
            .meta
            .regular_market_price
            .filter(|p| p.is_finite())
            .ok_or_else(|| Error::NoMarketData(ticker.to_string()))?;
        Ok(Quote { price })
    }

    async fn history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // End bound is exclusive on the wire; widen it to cover `end` itself.
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let result = self
            .chart(
                ticker,
                &[
                    ("interval", "1d".to_string()),
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                ],
            )
            .await?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote_block = result
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap_or_default();
        let closes = quote_block.close.unwrap_or_default();
        let volumes = quote_block.volume.unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let close = match closes.get(i).copied().flatten() {
                Some(c) if c.is_finite() => c,
                _ => continue, // holiday / missing bar
            };
            let Some(date) = DateTime::<Utc>::from_timestamp(*ts, 0).map(|dt| dt.date_naive())
            else {
                continue;
            };
            bars.push(Bar {
                date,
                close,
                volume: volumes.get(i).copied().flatten().unwrap_or(0),
            });
        }

        Ok(bars)
    }
}

// Response shape of the v8 chart endpoint, reduced to the fields used here.

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}
