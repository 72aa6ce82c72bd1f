use crate::domain::price::WeeklyChangeSource;
use crate::domain::weekly_change::{Category, WeeklyChangeRecord};
use crate::storage::MarketStore;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Drops rows without a usable weekly change and sorts the rest descending.
///
/// The sort is stable: equal changes keep their input order.
pub fn rank_rows(rows: Vec<WeeklyChangeSource>) -> Vec<WeeklyChangeRecord> {
    let mut out: Vec<WeeklyChangeRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let change = row.weekly_change.filter(|v| !v.is_nan())?;
            Some(WeeklyChangeRecord {
                date: row.date,
                ticker: row.ticker,
                one_week_pct_change: change,
                four_week_pct_change: None,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.one_week_pct_change
            .partial_cmp(&a.one_week_pct_change)
            .unwrap_or(Ordering::Equal)
    });
    out
}

/// Ranks the category's price rows for `reference` and inserts them as a snapshot.
pub async fn rank_and_persist(
    store: &dyn MarketStore,
    category: Category,
    tickers: &[String],
    reference: NaiveDate,
) -> anyhow::Result<Vec<WeeklyChangeRecord>> {
    let rows = store.weekly_change_rows(tickers, reference).await?;
    let fetched = rows.len();
    let ranked = rank_rows(rows);

    store.insert_change_records(category, &ranked).await?;

    tracing::info!(
        %category,
        reference_date = %reference,
        fetched,
        ranked = ranked.len(),
        "weekly snapshot persisted"
    );
    Ok(ranked)
}
