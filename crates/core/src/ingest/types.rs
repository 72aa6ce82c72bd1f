use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl BarField {
    pub const ALL: [BarField; 6] = [
        BarField::Open,
        BarField::High,
        BarField::Low,
        BarField::Close,
        BarField::AdjClose,
        BarField::Volume,
    ];

    /// Column header used in the intermediate file.
    pub fn column(self) -> &'static str {
        match self {
            BarField::Open => "Open",
            BarField::High => "High",
            BarField::Low => "Low",
            BarField::Close => "Close",
            BarField::AdjClose => "Adj Close",
            BarField::Volume => "Volume",
        }
    }
}

/// A provider bar before normalization. Any field may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn get(&self, field: BarField) -> Option<f64> {
        let v = match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::AdjClose => self.adj_close,
            BarField::Volume => self.volume,
        };
        v.filter(|x| !x.is_nan())
    }
}

/// Provider output grouped by ticker: the "wide" layout with one column group per symbol.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    pub by_ticker: BTreeMap<String, Vec<RawBar>>,
}

impl WideTable {
    pub fn insert(&mut self, ticker: impl Into<String>, bars: Vec<RawBar>) {
        self.by_ticker.insert(ticker.into(), bars);
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.values().all(|bars| bars.is_empty())
    }
}

/// One long-format row: `{date, ticker, <present fields>}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub values: BTreeMap<BarField, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    /// Fields that have at least one value, in `BarField::ALL` order.
    pub fields: Vec<BarField>,
    pub rows: Vec<LongRow>,
}
