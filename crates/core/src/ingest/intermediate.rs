//! Flat CSV file holding normalized rows between the download and load steps.
//!
//! Layout: `Date,Ticker,<present fields>` with one row per (ticker, date). Files are named by
//! the ingestion start date (`YYYYMMDD.csv`).

use crate::domain::price::PriceBar;
use crate::ingest::types::NormalizedTable;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub fn file_path(data_dir: &Path, start: NaiveDate) -> PathBuf {
    data_dir.join(format!("{}.csv", start.format("%Y%m%d")))
}

pub fn write_table<W: Write>(writer: W, table: &NormalizedTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Date", "Ticker"];
    header.extend(table.fields.iter().map(|f| f.column()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.push(row.ticker.clone());
        for field in &table.fields {
            record.push(
                row.values
                    .get(field)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

pub fn write_file(path: &Path, table: &NormalizedTable) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_table(file, table).with_context(|| format!("failed to write {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct CsvPriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Open", default)]
    open: Option<f64>,
    #[serde(rename = "High", default)]
    high: Option<f64>,
    #[serde(rename = "Low", default)]
    low: Option<f64>,
    #[serde(rename = "Close", default)]
    close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

/// Reads every row as a `PriceBar`. Any unparseable or incomplete row fails the whole file.
pub fn read_price_bars<R: Read>(reader: R) -> Result<Vec<PriceBar>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (idx, result) in rdr.deserialize::<CsvPriceRow>().enumerate() {
        // +2: header line and 1-based numbering.
        let line = idx + 2;
        let row = result.with_context(|| format!("invalid CSV row at line {line}"))?;
        out.push(into_price_bar(row).with_context(|| format!("invalid price row at line {line}"))?);
    }

    Ok(out)
}

pub fn read_file(path: &Path) -> Result<Vec<PriceBar>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_price_bars(file).with_context(|| format!("failed to read {}", path.display()))
}

fn into_price_bar(row: CsvPriceRow) -> Result<PriceBar> {
    let ticker = row.ticker.trim().to_string();
    anyhow::ensure!(!ticker.is_empty(), "ticker must be non-empty");

    let date = parse_date(&row.date)?;
    let volume = row.volume.context("Volume is required")?;
    anyhow::ensure!(volume.is_finite(), "Volume must be finite (got {volume})");

    Ok(PriceBar {
        date,
        ticker,
        open: row.open.context("Open is required")?,
        high: row.high.context("High is required")?,
        low: row.low.context("Low is required")?,
        close: row.close.context("Close is required")?,
        volume: volume.round() as i64,
    })
}

/// Accepts `YYYY-MM-DD` optionally followed by a time component.
fn parse_date(s: &str) -> Result<NaiveDate> {
    let t = s.trim();
    let day = t.get(..10).unwrap_or(t);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").with_context(|| format!("invalid Date: {t}"))
}
