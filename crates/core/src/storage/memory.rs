//! In-process `MarketStore` for exercising the pipeline without Postgres.

use crate::domain::price::{PriceBar, WeeklyChangeSource};
use crate::domain::weekly_change::{Category, WeeklyChangeRecord};
use crate::storage::MarketStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredBar {
    bar: PriceBar,
    weekly_change: Option<f64>,
}

#[derive(Debug, Default)]
struct Inner {
    bars: Vec<StoredBar>,
    changes: BTreeMap<Category, Vec<WeeklyChangeRecord>>,
    fail_writes: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn with_bars(bars: Vec<(PriceBar, Option<f64>)>) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().bars = bars
            .into_iter()
            .map(|(bar, weekly_change)| StoredBar { bar, weekly_change })
            .collect();
        store
    }

    /// Makes every write fail, simulating a lost connection.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    pub fn price_bar_count(&self) -> usize {
        self.inner.lock().unwrap().bars.len()
    }

    pub fn price_bar_now(&self, ticker: &str, date: NaiveDate) -> Option<PriceBar> {
        self.inner
            .lock()
            .unwrap()
            .bars
            .iter()
            .find(|s| s.bar.ticker == ticker && s.bar.date == date)
            .map(|s| s.bar.clone())
    }

    pub fn weekly_change_now(&self, ticker: &str, date: NaiveDate) -> Option<f64> {
        self.inner
            .lock()
            .unwrap()
            .bars
            .iter()
            .find(|s| s.bar.ticker == ticker && s.bar.date == date)
            .and_then(|s| s.weekly_change)
    }

    pub fn records_now(&self, category: Category) -> Vec<WeeklyChangeRecord> {
        self.inner
            .lock()
            .unwrap()
            .changes
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    fn check_writable(inner: &Inner) -> anyhow::Result<()> {
        anyhow::ensure!(!inner.fail_writes, "connection closed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MarketStore for MemoryStore {
    async fn insert_price_bars(&self, bars: &[PriceBar]) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        inner.bars.extend(bars.iter().cloned().map(|bar| StoredBar {
            bar,
            weekly_change: None,
        }));
        Ok(bars.len() as u64)
    }

    async fn price_bar(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Option<PriceBar>> {
        Ok(self.price_bar_now(ticker, date))
    }

    async fn weekly_change_rows(
        &self,
        tickers: &[String],
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeSource>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bars
            .iter()
            .filter(|s| s.bar.date == date && tickers.contains(&s.bar.ticker))
            .map(|s| WeeklyChangeSource {
                date: s.bar.date,
                ticker: s.bar.ticker.clone(),
                weekly_change: s.weekly_change,
            })
            .collect())
    }

    async fn set_weekly_change(
        &self,
        ticker: &str,
        date: NaiveDate,
        pct: f64,
    ) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let mut n = 0;
        for s in inner
            .bars
            .iter_mut()
            .filter(|s| s.bar.ticker == ticker && s.bar.date == date)
        {
            s.weekly_change = Some(pct);
            n += 1;
        }
        Ok(n)
    }

    async fn insert_change_records(
        &self,
        category: Category,
        records: &[WeeklyChangeRecord],
    ) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        inner
            .changes
            .entry(category)
            .or_default()
            .extend(records.iter().cloned());
        Ok(records.len() as u64)
    }

    async fn set_four_week_change(
        &self,
        category: Category,
        ticker: &str,
        date: NaiveDate,
        pct: f64,
    ) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let mut n = 0;
        if let Some(records) = inner.changes.get_mut(&category) {
            for r in records
                .iter_mut()
                .filter(|r| r.ticker == ticker && r.date == date)
            {
                r.four_week_pct_change = Some(pct);
                n += 1;
            }
        }
        Ok(n)
    }

    async fn change_records(
        &self,
        category: Category,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<WeeklyChangeRecord>> {
        Ok(self
            .records_now(category)
            .into_iter()
            .filter(|r| r.date == date)
            .collect())
    }
}
