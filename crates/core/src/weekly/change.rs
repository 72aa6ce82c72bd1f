use crate::domain::weekly_change::{Category, ReportDates};
use crate::storage::MarketStore;
use crate::weekly::error::{BadTicker, ChangeError};
use chrono::NaiveDate;

/// `(current - base) / base * 100`. A zero base fails instead of producing inf/NaN.
pub fn pct_change(base_close: f64, current_close: f64, base_date: NaiveDate) -> Result<f64, ChangeError> {
    if base_close == 0.0 {
        return Err(ChangeError::ZeroBaseClose { date: base_date });
    }
    let pct = (current_close - base_close) / base_close * 100.0;
    if !pct.is_finite() {
        return Err(ChangeError::NonFinite { value: pct });
    }
    Ok(pct)
}

/// Outcome of one per-ticker loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeReport {
    pub updated: Vec<(String, f64)>,
    /// Change computed but no row matched the update.
    pub no_target_row: Vec<String>,
    pub bad: Vec<BadTicker>,
}

/// Looks up both closes and computes the change. Store failures are the outer error; missing
/// data is the inner one.
pub async fn change_between(
    store: &dyn MarketStore,
    ticker: &str,
    reference: NaiveDate,
    lookback: NaiveDate,
) -> anyhow::Result<Result<f64, ChangeError>> {
    let Some(current) = store.price_bar(ticker, reference).await? else {
        return Ok(Err(ChangeError::MissingBar { date: reference }));
    };
    let Some(base) = store.price_bar(ticker, lookback).await? else {
        return Ok(Err(ChangeError::MissingBar { date: lookback }));
    };
    Ok(pct_change(base.close, current.close, lookback))
}

/// Back-fills `four_week_pct_change` on the category's snapshot rows for `dates.reference`.
///
/// Each ticker is queried, computed and committed on its own; a ticker without both bars is
/// logged as bad and skipped.
pub async fn four_week_changes(
    store: &dyn MarketStore,
    category: Category,
    tickers: &[String],
    dates: ReportDates,
) -> anyhow::Result<ChangeReport> {
    let mut report = ChangeReport::default();

    for ticker in tickers {
        match change_between(store, ticker, dates.reference, dates.four_week_lookback).await? {
            Ok(pct) => {
                let n = store
                    .set_four_week_change(category, ticker, dates.reference, pct)
                    .await?;
                if n == 0 {
                    tracing::warn!(%ticker, %category, reference_date = %dates.reference, "no snapshot row for four-week change");
                    report.no_target_row.push(ticker.clone());
                } else {
                    report.updated.push((ticker.clone(), pct));
                }
            }
            Err(reason) => {
                tracing::error!(%ticker, %category, %reason, "bad ticker in four-week change");
                report.bad.push(BadTicker {
                    ticker: ticker.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        %category,
        updated = report.updated.len(),
        bad = report.bad.len(),
        "four-week change populated"
    );
    Ok(report)
}

/// Writes the price table's `weekly_change` for `dates.reference` from the one-week lookback.
pub async fn backfill_weekly_change(
    store: &dyn MarketStore,
    tickers: &[String],
    dates: ReportDates,
) -> anyhow::Result<ChangeReport> {
    let mut report = ChangeReport::default();

    for ticker in tickers {
        match change_between(store, ticker, dates.reference, dates.one_week_lookback).await? {
            Ok(pct) => {
                let n = store.set_weekly_change(ticker, dates.reference, pct).await?;
                if n == 0 {
                    report.no_target_row.push(ticker.clone());
                } else {
                    report.updated.push((ticker.clone(), pct));
                }
            }
            Err(reason) => {
                tracing::error!(%ticker, %reason, "bad ticker in weekly change backfill");
                report.bad.push(BadTicker {
                    ticker: ticker.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        reference_date = %dates.reference,
        updated = report.updated.len(),
        bad = report.bad.len(),
        "weekly change backfilled"
    );
    Ok(report)
}
