use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ONE_WEEK_DAYS: i64 = 7;
pub const FOUR_WEEK_DAYS: i64 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Indexes,
    Commodities,
    Etfs,
}

impl Category {
    /// Processing order used by the weekly job.
    pub const ALL: [Category; 3] = [Category::Indexes, Category::Commodities, Category::Etfs];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Indexes => "indexes",
            Category::Commodities => "commodities",
            Category::Etfs => "etfs",
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Category::Indexes => "indexes_weekly_change",
            Category::Commodities => "commodities_weekly_change",
            Category::Etfs => "etfs_weekly_change",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indexes" | "index" => Ok(Category::Indexes),
            "commodities" | "commodity" => Ok(Category::Commodities),
            "etfs" | "etf" => Ok(Category::Etfs),
            other => anyhow::bail!("unknown category: {other}"),
        }
    }
}

/// Ranked snapshot row for one category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChangeRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub one_week_pct_change: f64,
    pub four_week_pct_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDates {
    pub reference: NaiveDate,
    pub one_week_lookback: NaiveDate,
    pub four_week_lookback: NaiveDate,
}

impl ReportDates {
    pub fn for_reference(reference: NaiveDate) -> Self {
        Self {
            reference,
            one_week_lookback: reference - Duration::days(ONE_WEEK_DAYS),
            four_week_lookback: reference - Duration::days(FOUR_WEEK_DAYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookbacks_are_calendar_offsets() {
        let r = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
        let d = ReportDates::for_reference(r);
        assert_eq!(d.one_week_lookback, NaiveDate::from_ymd_opt(2025, 11, 21).unwrap());
        assert_eq!(d.four_week_lookback, NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
    }

    #[test]
    fn parses_category_names() {
        assert_eq!("ETFs".parse::<Category>().unwrap(), Category::Etfs);
        assert_eq!("index".parse::<Category>().unwrap(), Category::Indexes);
        assert!("bonds".parse::<Category>().is_err());
        assert_eq!(Category::Commodities.table_name(), "commodities_weekly_change");
    }
}
