use crate::domain::weekly_change::{Category, WeeklyChangeRecord};
use anyhow::Context;
use chrono::NaiveDate;

pub async fn insert_records(
    pool: &sqlx::PgPool,
    category: Category,
    records: &[WeeklyChangeRecord],
) -> anyhow::Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let table = category.table_name();
    let sql = format!(
        "INSERT INTO {table} (date, ticker, one_week_pct_change, four_week_pct_change) \
         VALUES ($1, $2, $3, $4)"
    );

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    // Row by row so that ids follow ranking order.
    let mut inserted: u64 = 0;
    for record in records {
        let res = sqlx::query(&sql)
            .persistent(false)
            .bind(record.date)
            .bind(&record.ticker)
            .bind(record.one_week_pct_change)
            .bind(record.four_week_pct_change)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert {table} failed (ticker={})", record.ticker))?;
        inserted += res.rows_affected();
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

pub async fn set_four_week_change(
    pool: &sqlx::PgPool,
    category: Category,
    ticker: &str,
    date: NaiveDate,
    pct: f64,
) -> anyhow::Result<u64> {
    let table = category.table_name();
    let sql = format!(
        "UPDATE {table} SET four_week_pct_change = $3 WHERE ticker = $1 AND date = $2"
    );

    let res = sqlx::query(&sql)
        .persistent(false)
        .bind(ticker)
        .bind(date)
        .bind(pct)
        .execute(pool)
        .await
        .with_context(|| format!("update {table} failed (ticker={ticker}, date={date})"))?;
    Ok(res.rows_affected())
}

pub async fn records_for_date(
    pool: &sqlx::PgPool,
    category: Category,
    date: NaiveDate,
) -> anyhow::Result<Vec<WeeklyChangeRecord>> {
    let table = category.table_name();
    let sql = format!(
        "SELECT date, ticker, one_week_pct_change, four_week_pct_change \
         FROM {table} \
         WHERE date = $1 \
         ORDER BY id"
    );

    let rows = sqlx::query_as::<_, (NaiveDate, String, f64, Option<f64>)>(&sql)
        .persistent(false)
        .bind(date)
        .fetch_all(pool)
        .await
        .with_context(|| format!("select {table} failed (date={date})"))?;

    Ok(rows
        .into_iter()
        .map(
            |(date, ticker, one_week_pct_change, four_week_pct_change)| WeeklyChangeRecord {
                date,
                ticker,
                one_week_pct_change,
                four_week_pct_change,
            },
        )
        .collect())
}
