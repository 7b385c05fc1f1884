//! Absent-tolerant field extraction over decoded JSON payloads.
//!
//! Paths are JSON pointers (`/main/temp`, `/weather/0/description`). A
//! missing key, an out-of-range index or a value of the wrong type at any
//! level yields `None`.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

pub fn field<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    payload.pointer(path).filter(|v| !v.is_null())
}

pub fn text(payload: &Value, path: &str) -> Option<String> {
    field(payload, path)?.as_str().map(str::to_string)
}

pub fn float(payload: &Value, path: &str) -> Option<f64> {
    field(payload, path)?.as_f64()
}

/// Integer field; a float source value is truncated.
pub fn integer(payload: &Value, path: &str) -> Option<i64> {
    let v = field(payload, path)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

/// Epoch seconds → UTC calendar time.
pub fn epoch(payload: &Value, path: &str) -> Option<NaiveDateTime> {
    let secs = integer(payload, path)?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_levels_are_none() {
        let v = json!({ "main": { "temp": 281.5 }, "weather": [] });
        assert_eq!(float(&v, "/main/temp"), Some(281.5));
        assert_eq!(float(&v, "/main/feels_like"), None);
        assert_eq!(float(&v, "/wind/speed"), None);
        assert_eq!(text(&v, "/weather/0/description"), None);
        assert_eq!(text(&v, "/main/temp"), None);
    }

    #[test]
    fn test_null_is_absent() {
        let v = json!({ "main": { "humidity": null } });
        assert_eq!(integer(&v, "/main/humidity"), None);
    }

    #[test]
    fn test_integer_truncates_floats() {
        let v = json!({ "main": { "pressure": 1012.7, "humidity": 81 } });
        assert_eq!(integer(&v, "/main/pressure"), Some(1012));
        assert_eq!(integer(&v, "/main/humidity"), Some(81));
    }

    #[test]
    fn test_epoch_is_utc() {
        let v = json!({ "dt": 1_700_000_000 });
        let ts = epoch(&v, "/dt").unwrap();
        assert_eq!(ts.to_string(), "2023-11-14 22:13:20");
    }
}
