use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ticker's daily OHLCV values. Rows are append-only once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Projection of the price table used by the ranking step. `weekly_change` is produced
/// upstream of the snapshot job (see `weekly::backfill`) and may still be NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyChangeSource {
    pub date: NaiveDate,
    pub ticker: String,
    pub weekly_change: Option<f64>,
}
