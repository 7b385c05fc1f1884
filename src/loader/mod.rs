//! Reads an exported finance CSV back into bars, by column position.
//!
//! This is what a chart front end consumes: bars grouped per symbol and
//! sorted by time.

use crate::models::{FETCHED_AT_FORMAT, FinanceBar};
use crate::transform::{parse_price, parse_timestamp, parse_volume};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Columns: Symbol, Datetime, Open, High, Low, Close, Volume, fetched_at_utc
pub fn load_finance_csv(path: &Path) -> Result<Vec<FinanceBar>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let bars = read_finance_csv(file)?;
    info!("{:?}: {} bars loaded", path, bars.len());
    Ok(bars)
}

pub fn read_finance_csv<R: Read>(input: R) -> Result<Vec<FinanceBar>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut bars = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {}: {}", i + 1, e);
                continue;
            }
        };

        match row_to_bar(&record) {
            Some(bar) => bars.push(bar),
            None => warn!("Row {}: unreadable bar {:?}", i + 1, record),
        }
    }

    Ok(bars)
}

fn row_to_bar(record: &csv::StringRecord) -> Option<FinanceBar> {
    let symbol = record.get(0)?.trim();
    if symbol.is_empty() {
        return None;
    }

    Some(FinanceBar {
        symbol: symbol.to_string(),
        timestamp: parse_timestamp(record.get(1)?)?,
        open: parse_price(record.get(2)?)?,
        high: parse_price(record.get(3)?)?,
        low: parse_price(record.get(4)?)?,
        close: parse_price(record.get(5)?)?,
        volume: parse_volume(record.get(6)?)?,
        fetched_at: NaiveDateTime::parse_from_str(record.get(7)?.trim(), FETCHED_AT_FORMAT)
            .ok()
            .or_else(|| parse_timestamp(record.get(7)?))?,
    })
}

/// Per-symbol view of loaded bars.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStats {
    pub bars: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub last_close: f64,
}

/// Group by symbol; each group's bars are ordered by timestamp.
pub fn group_by_symbol(bars: Vec<FinanceBar>) -> BTreeMap<String, Vec<FinanceBar>> {
    let mut groups: BTreeMap<String, Vec<FinanceBar>> = BTreeMap::new();
    for bar in bars {
        groups.entry(bar.symbol.clone()).or_default().push(bar);
    }
    for series in groups.values_mut() {
        series.sort_by_key(|b| b.timestamp);
    }
    groups
}

pub fn symbol_stats(series: &[FinanceBar]) -> Option<SymbolStats> {
    let first = series.first()?;
    let last = series.last()?;
    Some(SymbolStats {
        bars: series.len(),
        first: first.timestamp,
        last: last.timestamp,
        last_close: last.close,
    })
}
