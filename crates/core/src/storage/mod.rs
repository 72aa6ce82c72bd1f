pub mod pg;
pub mod prices;
pub mod weekly_change;

#[cfg(test)]
pub mod memory;

use crate::domain::price::{PriceBar, WeeklyChangeSource};
use crate::domain::weekly_change::{Category, WeeklyChangeRecord};
use anyhow::Context;
use chrono::NaiveDate;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Typed access to the price-history table and the three change-snapshot tables.
#[async_trait::async_trait]
pub trait MarketStore: Send + Sync {
    /// Inserts all bars in one transaction. Returns rows inserted.
    async fn insert_price_bars(&self, bars: &[PriceBar]) -> anyhow::Result<u64>;

    /// First stored bar for `(ticker, date)`, if any.
    async fn price_bar(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Option<PriceBar>>;

    async fn weekly_change_rows(
        &self,
        tickers: &[String],
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeSource>>;

    async fn set_weekly_change(&self, ticker: &str, date: NaiveDate, pct: f64)
        -> anyhow::Result<u64>;

    /// Inserts snapshot rows in the given order, in one transaction.
    async fn insert_change_records(
        &self,
        category: Category,
        records: &[WeeklyChangeRecord],
    ) -> anyhow::Result<u64>;

    /// Sets the four-week field of the `(ticker, date)` snapshot row and commits.
    async fn set_four_week_change(
        &self,
        category: Category,
        ticker: &str,
        date: NaiveDate,
        pct: f64,
    ) -> anyhow::Result<u64>;

    /// Snapshot rows for `date` in insertion order.
    async fn change_records(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeRecord>>;
}
