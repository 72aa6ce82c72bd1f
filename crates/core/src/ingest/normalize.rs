use crate::ingest::types::{BarField, LongRow, NormalizedTable, WideTable};
use std::collections::BTreeMap;

/// Reshapes a per-ticker wide table into long rows.
///
/// Output rows are sorted by `(date, ticker)`. A row with no values at all is dropped, and a
/// field that is absent from every remaining row is dropped from `fields`.
pub fn normalize(wide: &WideTable) -> NormalizedTable {
    let mut rows: Vec<LongRow> = Vec::new();

    for (ticker, bars) in &wide.by_ticker {
        for bar in bars {
            let values: BTreeMap<BarField, f64> = BarField::ALL
                .iter()
                .filter_map(|f| bar.get(*f).map(|v| (*f, v)))
                .collect();
            if values.is_empty() {
                continue;
            }
            rows.push(LongRow {
                date: bar.date,
                ticker: ticker.clone(),
                values,
            });
        }
    }

    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));

    let fields = BarField::ALL
        .iter()
        .copied()
        .filter(|f| rows.iter().any(|r| r.values.contains_key(f)))
        .collect();

    NormalizedTable { fields, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::RawBar;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn bar(day: u32, close: Option<f64>) -> RawBar {
        RawBar {
            date: d(day),
            open: close.map(|c| c - 1.0),
            high: close.map(|c| c + 1.0),
            low: close.map(|c| c - 2.0),
            close,
            adj_close: None,
            volume: close.map(|_| 1000.0),
        }
    }

    #[test]
    fn reshapes_wide_to_long_sorted_by_date_then_ticker() {
        let mut wide = WideTable::default();
        wide.insert("XLK", vec![bar(28, Some(120.0)), bar(29, Some(121.0))]);
        wide.insert("SMH", vec![bar(28, Some(300.0)), bar(29, Some(305.0))]);

        let out = normalize(&wide);
        let keys: Vec<_> = out.rows.iter().map(|r| (r.date, r.ticker.as_str())).collect();
        assert_eq!(
            keys,
            vec![(d(28), "SMH"), (d(28), "XLK"), (d(29), "SMH"), (d(29), "XLK")]
        );
        assert_eq!(out.rows[1].values.get(&BarField::Close).copied(), Some(120.0));
    }

    #[test]
    fn drops_fully_absent_columns_and_empty_rows() {
        let mut wide = WideTable::default();
        wide.insert("XLK", vec![bar(28, Some(120.0)), bar(29, None)]);
        wide.insert("BAD", vec![bar(28, None)]);

        let out = normalize(&wide);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(
            out.fields,
            vec![BarField::Open, BarField::High, BarField::Low, BarField::Close, BarField::Volume]
        );
    }

    #[test]
    fn nan_counts_as_absent() {
        let mut wide = WideTable::default();
        let mut b = bar(28, Some(10.0));
        b.adj_close = Some(f64::NAN);
        wide.insert("XLK", vec![b]);

        let out = normalize(&wide);
        assert!(!out.fields.contains(&BarField::AdjClose));
    }
}
