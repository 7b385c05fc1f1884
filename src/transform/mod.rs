pub mod fields;
pub mod finance;
pub mod weather;

pub use self::finance::normalize_time_series;
pub use self::weather::normalize_weather;

use crate::error::{EtlError, Result};
use chrono::{NaiveDate, NaiveDateTime};

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Parse a feed timestamp: a bare date (midnight) or a date-time.
/// "2024-02-20" | "2024-02-20 15:00:00" | "2024-02-20T15:00"
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Operator-supplied range bound, `YYYY-MM-DD`.
pub fn parse_range_bound(s: &str) -> Result<NaiveDateTime> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EtlError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", s.trim())))
}

/// Parse a price; only finite values are accepted.
pub fn parse_price(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Parse a volume as a float, then truncate.
/// "1500" → 1500 | "1500.9" → 1500
pub fn parse_volume(s: &str) -> Option<i64> {
    parse_price(s).map(|v| v as i64)
}

pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_dates_and_datetimes() {
        assert_eq!(
            parse_timestamp("2024-02-20").unwrap().to_string(),
            "2024-02-20 00:00:00"
        );
        assert_eq!(
            parse_timestamp("2024-02-20 15:30:00").unwrap().to_string(),
            "2024-02-20 15:30:00"
        );
        assert_eq!(
            parse_timestamp("2024-02-20T15:30").unwrap().to_string(),
            "2024-02-20 15:30:00"
        );
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_range_bound() {
        assert_eq!(
            parse_range_bound(" 2024-01-31 ").unwrap().to_string(),
            "2024-01-31 00:00:00"
        );
        assert!(matches!(
            parse_range_bound("31/01/2024"),
            Err(EtlError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_price("185.2300"), Some(185.23));
        assert_eq!(parse_price(" 10 "), Some(10.0));
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_volume("1500.9"), Some(1500));
        assert_eq!(parse_volume("23456789"), Some(23_456_789));
        assert_eq!(parse_volume("-"), None);
    }

    #[test]
    fn test_normalise_symbol() {
        assert_eq!(normalise_symbol(" aapl "), "AAPL");
    }
}
