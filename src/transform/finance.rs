//! Time-series payload → ordered `FinanceBar`s.
//!
//! Entries are visited in payload order. Metric values are read by position
//! (open, high, low, close, volume); the labels are ignored, so an upstream
//! field reorder would go unnoticed.

use crate::error::{EtlError, Result};
use crate::models::{DateRange, FinanceBar, FinanceTally};
use crate::transform::{parse_price, parse_timestamp, parse_volume};
use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, warn};

const SERIES_MARKER: &str = "Time Series";

#[derive(Debug, Clone, PartialEq)]
pub struct FinanceBatch {
    pub bars: Vec<FinanceBar>,
    pub tally: FinanceTally,
    /// First and last timestamp keys as they appear in the payload.
    pub available: Option<(String, String)>,
}

/// Name of the first key containing "Time Series" (case-sensitive).
pub fn find_series_key(payload: &Value) -> Option<&str> {
    payload
        .as_object()?
        .keys()
        .find(|k| k.contains(SERIES_MARKER))
        .map(String::as_str)
}

pub fn normalize_time_series(
    symbol: &str,
    payload: &Value,
    range: &DateRange,
    fetched_at: NaiveDateTime,
) -> Result<FinanceBatch> {
    let series = find_series_key(payload)
        .and_then(|k| payload.get(k))
        .and_then(Value::as_object)
        .ok_or_else(|| EtlError::NoTimeSeriesFound {
            symbol: symbol.to_string(),
            keys: payload
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        })?;

    debug!("{}: {} entries in time series", symbol, series.len());

    let mut tally = FinanceTally::default();
    let mut bars = Vec::with_capacity(series.len());

    for (ts_str, metrics) in series {
        tally.seen += 1;

        let Some(timestamp) = parse_timestamp(ts_str) else {
            warn!("{}: unparseable timestamp {:?}, skipping", symbol, ts_str);
            tally.skipped += 1;
            continue;
        };

        if !range.contains(&timestamp) {
            tally.filtered += 1;
            continue;
        }

        let values: Vec<&Value> = match metrics.as_object() {
            Some(m) => m.values().collect(),
            None => Vec::new(),
        };
        if values.len() < 5 {
            warn!("{}: insufficient fields at {} ({:?})", symbol, ts_str, values);
            tally.skipped += 1;
            continue;
        }

        match build_bar(symbol, timestamp, &values, fetched_at) {
            Some(bar) => bars.push(bar),
            None => {
                warn!("{}: could not parse values at {}, skipping", symbol, ts_str);
                tally.skipped += 1;
            }
        }
    }

    tally.written = bars.len();
    let available = series
        .keys()
        .next()
        .zip(series.keys().next_back())
        .map(|(first, last)| (first.clone(), last.clone()));

    Ok(FinanceBatch { bars, tally, available })
}

fn build_bar(
    symbol: &str,
    timestamp: NaiveDateTime,
    values: &[&Value],
    fetched_at: NaiveDateTime,
) -> Option<FinanceBar> {
    let price = |i: usize| number_text(values[i]).as_deref().and_then(parse_price);

    Some(FinanceBar {
        symbol: symbol.to_string(),
        timestamp,
        open: price(0)?,
        high: price(1)?,
        low: price(2)?,
        close: price(3)?,
        volume: number_text(values[4]).as_deref().and_then(parse_volume)?,
        fetched_at,
    })
}

/// Metric values arrive as strings; bare JSON numbers are accepted too.
fn number_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::parse_range_bound;
    use chrono::Utc;
    use serde_json::json;

    fn entry(o: &str, h: &str, l: &str, c: &str, v: &str) -> Value {
        json!({ "1. open": o, "2. high": h, "3. low": l, "4. close": c, "5. volume": v })
    }

    fn daily_payload() -> Value {
        json!({
            "Meta Data": { "2. Symbol": "IBM" },
            "Time Series (Daily)": {
                "2024-01-05": entry("160.0", "162.5", "159.1", "161.7", "4100000"),
                "2024-01-04": entry("158.2", "160.4", "157.9", "160.0", "3900000"),
                "2024-01-03": entry("157.0", "158.8", "156.1", "158.2", "3650000.0"),
                "2024-01-02": entry("155.5", "157.3", "155.0", "157.0", "3200000")
            }
        })
    }

    fn range(start: Option<&str>, end: Option<&str>) -> DateRange {
        DateRange {
            start: start.map(|s| parse_range_bound(s).unwrap()),
            end: end.map(|s| parse_range_bound(s).unwrap()),
        }
    }

    #[test]
    fn test_all_entries_in_payload_order() {
        let now = Utc::now().naive_utc();
        let batch = normalize_time_series("IBM", &daily_payload(), &DateRange::default(), now).unwrap();

        assert_eq!(batch.tally, FinanceTally { seen: 4, filtered: 0, skipped: 0, written: 4 });
        let dates: Vec<String> = batch.bars.iter().map(|b| b.timestamp.date().to_string()).collect();
        assert_eq!(dates, ["2024-01-05", "2024-01-04", "2024-01-03", "2024-01-02"]);

        let first = &batch.bars[0];
        assert_eq!(first.symbol, "IBM");
        assert_eq!(first.open, 160.0);
        assert_eq!(first.high, 162.5);
        assert_eq!(first.low, 159.1);
        assert_eq!(first.close, 161.7);
        assert_eq!(first.volume, 4_100_000);
        assert_eq!(batch.bars[2].volume, 3_650_000);
        assert_eq!(
            batch.available,
            Some(("2024-01-05".to_string(), "2024-01-02".to_string()))
        );
    }

    #[test]
    fn test_range_is_inclusive_and_drops_outside() {
        let now = Utc::now().naive_utc();
        let r = range(Some("2024-01-03"), Some("2024-01-04"));
        let batch = normalize_time_series("IBM", &daily_payload(), &r, now).unwrap();

        assert_eq!(batch.tally.seen, 4);
        assert_eq!(batch.tally.filtered, 2);
        assert_eq!(batch.tally.written, 2);
        assert!(batch.bars.iter().all(|b| r.contains(&b.timestamp)));
    }

    #[test]
    fn test_positional_values_ignore_labels() {
        let payload = json!({
            "Time Series (60min)": {
                "2024-01-05 10:00:00": { "a": "1.0", "b": "2.0", "c": "0.5", "d": "1.5", "e": "100" }
            }
        });
        let batch = normalize_time_series("X", &payload, &DateRange::default(), Utc::now().naive_utc()).unwrap();
        let bar = &batch.bars[0];
        assert_eq!((bar.open, bar.high, bar.low, bar.close, bar.volume), (1.0, 2.0, 0.5, 1.5, 100));
        assert_eq!(bar.timestamp.to_string(), "2024-01-05 10:00:00");
    }

    #[test]
    fn test_malformed_entries_skip_only_themselves() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-05": entry("160.0", "162.5", "159.1", "161.7", "4100000"),
                "2024-01-04": { "1. open": "158.2", "2. high": "160.4" },
                "2024-01-03": entry("157.0", "oops", "156.1", "158.2", "3650000"),
                "not a date": entry("1", "1", "1", "1", "1"),
                "2024-01-02": entry("155.5", "157.3", "155.0", "157.0", "3200000")
            }
        });
        let batch = normalize_time_series("IBM", &payload, &DateRange::default(), Utc::now().naive_utc()).unwrap();
        assert_eq!(batch.tally, FinanceTally { seen: 5, filtered: 0, skipped: 3, written: 2 });
        assert_eq!(batch.bars.len(), 2);
    }

    #[test]
    fn test_numeric_json_values_accepted() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-05": { "1": 10.5, "2": 11, "3": 10, "4": 10.75, "5": 1200 }
            }
        });
        let batch = normalize_time_series("X", &payload, &DateRange::default(), Utc::now().naive_utc()).unwrap();
        assert_eq!(batch.bars[0].high, 11.0);
        assert_eq!(batch.bars[0].volume, 1200);
    }

    #[test]
    fn test_missing_series_is_an_error() {
        let payload = json!({ "Note": "Thank you for using Alpha Vantage!" });
        let err = normalize_time_series("IBM", &payload, &DateRange::default(), Utc::now().naive_utc())
            .unwrap_err();
        match err {
            EtlError::NoTimeSeriesFound { symbol, keys } => {
                assert_eq!(symbol, "IBM");
                assert_eq!(keys, ["Note"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_series_key_match_is_case_sensitive() {
        let payload = json!({ "time series (daily)": {}, "Weekly Time Series": {} });
        assert_eq!(find_series_key(&payload), Some("Weekly Time Series"));
        assert_eq!(find_series_key(&json!({ "time series": {} })), None);
    }

    #[test]
    fn test_idempotent() {
        let now = Utc::now().naive_utc();
        let a = normalize_time_series("IBM", &daily_payload(), &DateRange::default(), now).unwrap();
        let b = normalize_time_series("IBM", &daily_payload(), &DateRange::default(), now).unwrap();
        assert_eq!(a, b);
    }
}
