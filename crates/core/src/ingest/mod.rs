pub mod intermediate;
pub mod normalize;
pub mod provider;
pub mod types;

use crate::ingest::provider::MarketDataProvider;
use crate::storage::MarketStore;
use anyhow::Context;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub tickers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub inserted: u64,
}

/// Fetches `tickers` from `start` (inclusive) to `end` (exclusive), normalizes them and
/// writes the intermediate file for `start`.
///
/// Failures are logged and swallowed; callers only see `None`.
pub async fn download(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    data_dir: &Path,
) -> Option<DownloadOutcome> {
    match try_download(provider, tickers, start, end, data_dir).await {
        Ok(outcome) => {
            tracing::info!(
                provider = provider.provider_name(),
                path = %outcome.path.display(),
                rows = outcome.rows,
                tickers = outcome.tickers,
                "provider data downloaded"
            );
            Some(outcome)
        }
        Err(err) => {
            tracing::error!(
                provider = provider.provider_name(),
                %start,
                error = %format!("{err:#}"),
                "provider download failed"
            );
            None
        }
    }
}

pub async fn try_download(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    data_dir: &Path,
) -> anyhow::Result<DownloadOutcome> {
    let wide = provider
        .fetch(tickers, start, end)
        .await
        .context("provider fetch failed")?;
    anyhow::ensure!(!wide.is_empty(), "provider returned no bars for {start}..{end}");

    let table = normalize::normalize(&wide);
    let tickers_with_rows = {
        let mut seen: Vec<&str> = table.rows.iter().map(|r| r.ticker.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };

    let path = intermediate::file_path(data_dir, start);
    intermediate::write_file(&path, &table)?;

    Ok(DownloadOutcome {
        path,
        rows: table.rows.len(),
        tickers: tickers_with_rows,
    })
}

/// Reads the intermediate file for `start` and inserts every row into the price table in a
/// single transaction.
///
/// Re-running on the same file inserts the rows again; the price table has no uniqueness
/// constraint on (ticker, date). Failures are logged and swallowed.
pub async fn load(store: &dyn MarketStore, start: NaiveDate, data_dir: &Path) -> Option<LoadOutcome> {
    let path = intermediate::file_path(data_dir, start);
    match try_load(store, &path).await {
        Ok(inserted) => {
            tracing::info!(path = %path.display(), inserted, "price table populated");
            Some(LoadOutcome { path, inserted })
        }
        Err(err) => {
            tracing::error!(
                path = %path.display(),
                error = %format!("{err:#}"),
                "price table population failed"
            );
            None
        }
    }
}

pub async fn try_load(store: &dyn MarketStore, path: &Path) -> anyhow::Result<u64> {
    let bars = intermediate::read_file(path)?;
    tracing::info!(path = %path.display(), rows = bars.len(), "intermediate file read");
    if bars.is_empty() {
        return Ok(0);
    }
    store.insert_price_bars(&bars).await
}
