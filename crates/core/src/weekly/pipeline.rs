use crate::domain::weekly_change::{Category, ReportDates};
use crate::notify::Notifier;
use crate::storage::MarketStore;
use crate::universe::TickerUniverse;
use crate::weekly::change::{self, ChangeReport};
use crate::weekly::rank;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub category: Category,
    pub snapshot_rows: usize,
    pub four_week: ChangeReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub dates: ReportDates,
    pub categories: Vec<CategoryReport>,
}

impl WeeklyReport {
    pub fn bad_tickers(&self) -> usize {
        self.categories.iter().map(|c| c.four_week.bad.len()).sum()
    }
}

/// Snapshot every category, then back-fill four-week changes, both in `Category::ALL` order.
///
/// Per-ticker gaps are recorded in the report. A store error aborts the run.
pub async fn run_weekly(
    store: &dyn MarketStore,
    universe: &TickerUniverse,
    dates: ReportDates,
) -> anyhow::Result<WeeklyReport> {
    tracing::info!(
        reference_date = %dates.reference,
        four_week_lookback = %dates.four_week_lookback,
        "starting weekly change run"
    );

    let mut snapshot_rows = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let ranked =
            rank::rank_and_persist(store, category, universe.tickers(category), dates.reference)
                .await?;
        snapshot_rows.push(ranked.len());
    }

    let mut categories = Vec::with_capacity(Category::ALL.len());
    for (category, rows) in Category::ALL.into_iter().zip(snapshot_rows) {
        let four_week =
            change::four_week_changes(store, category, universe.tickers(category), dates).await?;
        categories.push(CategoryReport {
            category,
            snapshot_rows: rows,
            four_week,
        });
    }

    Ok(WeeklyReport { dates, categories })
}

/// `run_weekly` followed by the notifier handoff. The notifier only runs when the tables
/// were written.
pub async fn run_weekly_and_notify(
    store: &dyn MarketStore,
    universe: &TickerUniverse,
    dates: ReportDates,
    notifier: Option<&Notifier>,
) -> anyhow::Result<WeeklyReport> {
    let report = run_weekly(store, universe, dates).await?;

    match notifier {
        Some(n) => {
            n.invoke().await;
        }
        None => tracing::info!("NOTIFIER_PATH not set; skipping notifier handoff"),
    }

    tracing::info!(
        reference_date = %dates.reference,
        bad_tickers = report.bad_tickers(),
        "finished weekly change run"
    );
    Ok(report)
}
