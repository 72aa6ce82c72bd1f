use crate::config::Settings;
use crate::ingest::types::{RawBar, WideTable};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQ_DELAY_MS: u64 = 250;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars for `tickers` in `[start, end)`, grouped by ticker.
    async fn fetch(&self, tickers: &[String], start: NaiveDate, end: NaiveDate)
        -> Result<WideTable>;
}

/// Yahoo v8 chart API, one request per ticker.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    req_delay: Duration,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .data_provider_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("DATA_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let req_delay_ms = std::env::var("DATA_PROVIDER_REQ_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQ_DELAY_MS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            req_delay: Duration::from_millis(req_delay_ms),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    async fn fetch_one(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp();

        let res = self
            .http
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .context("chart request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read chart response")?;
        if !status.is_success() {
            anyhow::bail!("chart HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .context("failed to parse chart response")?;
        parse_chart(parsed, start, end)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WideTable> {
        anyhow::ensure!(!tickers.is_empty(), "tickers must be non-empty");
        anyhow::ensure!(start < end, "start ({start}) must be before end ({end})");

        let mut table = WideTable::default();
        let mut failures: usize = 0;

        for (idx, ticker) in tickers.iter().enumerate() {
            if idx != 0 {
                tokio::time::sleep(self.req_delay).await;
            }

            match self.fetch_one(ticker, start, end).await {
                Ok(bars) => {
                    tracing::debug!(%ticker, bars = bars.len(), "chart fetched");
                    table.insert(ticker.clone(), bars);
                }
                Err(err) => {
                    failures += 1;
                    tracing::warn!(%ticker, error = %format!("{err:#}"), "chart fetch failed; skipping ticker");
                }
            }
        }

        anyhow::ensure!(
            failures < tickers.len(),
            "all {} ticker requests failed",
            tickers.len()
        );

        tracing::info!(
            tickers = tickers.len(),
            failures,
            %start,
            %end,
            "provider fetch finished"
        );
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn parse_chart(resp: ChartResponse, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>> {
    let Some(results) = resp.chart.result else {
        match resp.chart.error {
            Some(err) => anyhow::bail!("chart error {}: {}", err.code, err.description),
            None => anyhow::bail!("chart response has neither result nor error"),
        }
    };

    let data = results
        .into_iter()
        .next()
        .context("chart result array is empty")?;

    // No timestamps means no sessions in range.
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let at = |col: &Vec<Option<f64>>, i: usize| col.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        // Session timestamps are exchange-local opens; shift before taking the date.
        let date = chrono::DateTime::from_timestamp(ts + data.meta.gmtoffset, 0)
            .map(|dt| dt.date_naive())
            .with_context(|| format!("invalid timestamp: {ts}"))?;
        if date < start || date >= end {
            continue;
        }

        bars.push(RawBar {
            date,
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            adj_close: at(&adj_closes, i),
            volume: at(&quote.volume, i),
        });
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn parses_chart_shape_into_raw_bars() {
        // 2025-10-28 13:30 UTC and 2025-10-29 13:30 UTC, New York offset -4h.
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": -14400},
                    "timestamp": [1761658200, 1761744600],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, null],
                            "high": [101.0, 103.0],
                            "low": [99.0, 101.5],
                            "close": [100.5, 102.0],
                            "volume": [1000, 2000]
                        }],
                        "adjclose": [{"adjclose": [100.4, 101.9]}]
                    }
                }],
                "error": null
            }
        });

        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let bars = parse_chart(parsed, d(1), d(31)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(28));
        assert_eq!(bars[1].date, d(29));
        assert_eq!(bars[1].open, None);
        assert_eq!(bars[1].volume, Some(2000.0));
        assert_eq!(bars[0].adj_close, Some(100.4));
    }

    #[test]
    fn drops_sessions_outside_requested_range() {
        let v = json!({
            "chart": {
                "result": [{
                    "timestamp": [1761658200],
                    "indicators": {"quote": [{"close": [1.0]}]}
                }],
                "error": null
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        assert!(parse_chart(parsed, d(1), d(28)).unwrap().is_empty());
    }

    #[test]
    fn surfaces_chart_error() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let err = parse_chart(parsed, d(1), d(31)).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }
}
