use crate::domain::price::{PriceBar, WeeklyChangeSource};
use anyhow::Context;
use chrono::NaiveDate;

const DEFAULT_INSERT_BATCH: usize = 200;

/// Appends bars to `stock_data` in multi-row INSERTs inside one transaction.
///
/// No conflict handling: the table has no (ticker, date) uniqueness, so repeated loads
/// duplicate rows.
pub async fn insert_price_bars(pool: &sqlx::PgPool, bars: &[PriceBar]) -> anyhow::Result<u64> {
    anyhow::ensure!(!bars.is_empty(), "bars must be non-empty");

    let chunk_size: usize = std::env::var("PRICE_BARS_INSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_INSERT_BATCH);
    anyhow::ensure!(chunk_size >= 1, "PRICE_BARS_INSERT_BATCH must be >= 1");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let mut inserted: u64 = 0;
    for (batch_idx, chunk) in bars.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO stock_data (date, ticker, open, high, low, close, volume) ",
        );
        qb.push_values(chunk, |mut b, bar| {
            b.push_bind(bar.date)
                .push_bind(bar.ticker.trim())
                .push_bind(bar.open)
                .push_bind(bar.high)
                .push_bind(bar.low)
                .push_bind(bar.close)
                .push_bind(bar.volume);
        });

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch insert stock_data failed")?;
        inserted += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "stock_data batch insert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

pub async fn price_bar(
    pool: &sqlx::PgPool,
    ticker: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<PriceBar>> {
    let row = sqlx::query_as::<_, (NaiveDate, String, f64, f64, f64, f64, i64)>(
        "SELECT date, ticker, open, high, low, close, volume \
         FROM stock_data \
         WHERE ticker = $1 AND date = $2 \
         ORDER BY id \
         LIMIT 1",
    )
    .persistent(false)
    .bind(ticker)
    .bind(date)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select stock_data failed (ticker={ticker}, date={date})"))?;

    Ok(row.map(|(date, ticker, open, high, low, close, volume)| PriceBar {
        date,
        ticker,
        open,
        high,
        low,
        close,
        volume,
    }))
}

pub async fn weekly_change_rows(
    pool: &sqlx::PgPool,
    tickers: &[String],
    date: NaiveDate,
) -> anyhow::Result<Vec<WeeklyChangeSource>> {
    let rows = sqlx::query_as::<_, (NaiveDate, String, Option<f64>)>(
        "SELECT date, ticker, weekly_change \
         FROM stock_data \
         WHERE ticker = ANY($1) AND date = $2 \
         ORDER BY id",
    )
    .persistent(false)
    .bind(tickers)
    .bind(date)
    .fetch_all(pool)
    .await
    .with_context(|| format!("select weekly_change rows failed (date={date})"))?;

    Ok(rows
        .into_iter()
        .map(|(date, ticker, weekly_change)| WeeklyChangeSource {
            date,
            ticker,
            weekly_change,
        })
        .collect())
}

pub async fn set_weekly_change(
    pool: &sqlx::PgPool,
    ticker: &str,
    date: NaiveDate,
    pct: f64,
) -> anyhow::Result<u64> {
    let res = sqlx::query("UPDATE stock_data SET weekly_change = $3 WHERE ticker = $1 AND date = $2")
        .persistent(false)
        .bind(ticker)
        .bind(date)
        .bind(pct)
        .execute(pool)
        .await
        .with_context(|| format!("update stock_data weekly_change failed (ticker={ticker}, date={date})"))?;
    Ok(res.rows_affected())
}
