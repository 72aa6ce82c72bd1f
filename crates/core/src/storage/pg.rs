use crate::domain::price::{PriceBar, WeeklyChangeSource};
use crate::domain::weekly_change::{Category, WeeklyChangeRecord};
use crate::storage::{prices, weekly_change, MarketStore};
use anyhow::Context;
use chrono::NaiveDate;

/// Postgres-backed `MarketStore`. Open with `connect`, release with `close`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        // Steps run one after another; one connection is enough.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("connect DATABASE_URL failed")?;

        super::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl MarketStore for PgStore {
    async fn insert_price_bars(&self, bars: &[PriceBar]) -> anyhow::Result<u64> {
        prices::insert_price_bars(&self.pool, bars).await
    }

    async fn price_bar(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Option<PriceBar>> {
        prices::price_bar(&self.pool, ticker, date).await
    }

    async fn weekly_change_rows(
        &self,
        tickers: &[String],
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeSource>> {
        prices::weekly_change_rows(&self.pool, tickers, date).await
    }

    async fn set_weekly_change(
        &self,
        ticker: &str,
        date: NaiveDate,
        pct: f64,
    ) -> anyhow::Result<u64> {
        prices::set_weekly_change(&self.pool, ticker, date, pct).await
    }

    async fn insert_change_records(
        &self,
        category: Category,
        records: &[WeeklyChangeRecord],
    ) -> anyhow::Result<u64> {
        weekly_change::insert_records(&self.pool, category, records).await
    }

    async fn set_four_week_change(
        &self,
        category: Category,
        ticker: &str,
        date: NaiveDate,
        pct: f64,
    ) -> anyhow::Result<u64> {
        weekly_change::set_four_week_change(&self.pool, category, ticker, date, pct).await
    }

    async fn change_records(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeRecord>> {
        weekly_change::records_for_date(&self.pool, category, date).await
    }
}
