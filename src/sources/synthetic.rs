//! Placeholder payloads shaped like the real API responses.
//!
//! Values are random; the shape and the per-city/per-symbol anchors are
//! fixed.

use chrono::{Duration, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};

// ── Weather ───────────────────────────────────────────────────────────────────

struct DemoCity {
    name: &'static str,
    country: &'static str,
    description: &'static str,
    base_kelvin: f64,
    pressure: i64,
    humidity: i64,
    wind: (f64, f64),
}

const DEMO_CITIES: &[DemoCity] = &[
    DemoCity {
        name: "London",
        country: "GB",
        description: "light rain",
        base_kelvin: 280.0,
        pressure: 1010,
        humidity: 70,
        wind: (2.0, 6.0),
    },
    DemoCity {
        name: "New York",
        country: "US",
        description: "clear sky",
        base_kelvin: 285.0,
        pressure: 1015,
        humidity: 60,
        wind: (3.0, 8.0),
    },
    DemoCity {
        name: "Tokyo",
        country: "JP",
        description: "few clouds",
        base_kelvin: 290.0,
        pressure: 1012,
        humidity: 65,
        wind: (1.0, 4.0),
    },
];

/// Current-weather payload for a known demo city; anything else gets the
/// first entry (London).
pub fn weather(city: &str) -> Value {
    let demo = DEMO_CITIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(city.trim()))
        .unwrap_or(&DEMO_CITIES[0]);

    let base = demo.base_kelvin;
    let wind = (rand::random_range(demo.wind.0..demo.wind.1) * 100.0).round() / 100.0;

    json!({
        "name": demo.name,
        "sys": { "country": demo.country },
        "weather": [{ "description": demo.description }],
        "main": {
            "temp": base + rand::random_range(0.0..5.0),
            "feels_like": base + rand::random_range(0.0..5.0),
            "temp_min": base + rand::random_range(0.0..3.0),
            "temp_max": base + rand::random_range(2.0..5.0),
            "pressure": demo.pressure + rand::random_range(-10..=10_i64),
            "humidity": demo.humidity + rand::random_range(-20..=20_i64),
        },
        "wind": { "speed": wind },
        "dt": Utc::now().timestamp(),
    })
}

// ── Finance ───────────────────────────────────────────────────────────────────

const BASE_PRICES: &[(&str, f64)] = &[
    ("AAPL", 180.0),
    ("MSFT", 330.0),
    ("GOOGL", 135.0),
    ("TSLA", 240.0),
    ("AMZN", 150.0),
    ("META", 320.0),
    ("NVDA", 450.0),
    ("IBM", 160.0),
];

const DEFAULT_BASE_PRICE: f64 = 100.0;

pub const DAILY_BARS: i64 = 30;
pub const INTRADAY_BARS: i64 = 24;

pub fn base_price(symbol: &str) -> f64 {
    BASE_PRICES
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol.trim()))
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_BASE_PRICE)
}

/// Price-move bands for one bar shape: open drift, close drift, wick range,
/// volume range.
struct Jitter {
    open: f64,
    close: f64,
    wick: (f64, f64),
    volume: (i64, i64),
}

const DAILY_JITTER: Jitter = Jitter {
    open: 0.02,
    close: 0.03,
    wick: (0.01, 0.03),
    volume: (1_000_000, 50_000_000),
};

const INTRADAY_JITTER: Jitter = Jitter {
    open: 0.01,
    close: 0.02,
    wick: (0.005, 0.015),
    volume: (100_000, 5_000_000),
};

pub const INTRADAY_SERIES_KEY: &str = "Time Series (60min)";

/// 30 daily bars ending yesterday, oldest first.
pub fn daily(symbol: &str) -> Value {
    let now = Utc::now();
    let mut series = Map::new();

    for i in 0..DAILY_BARS {
        let day = now - Duration::days(DAILY_BARS - i);
        series.insert(
            day.format("%Y-%m-%d").to_string(),
            random_bar(base_price(symbol), &DAILY_JITTER),
        );
    }

    envelope(symbol, "Daily", "Time Series (Daily)".to_string(), series)
}

/// 24 hourly bars ending an hour ago, oldest first. The series is always
/// hourly, whatever granularity the live request asked for.
pub fn intraday(symbol: &str) -> Value {
    let now = Utc::now();
    let mut series = Map::new();

    for i in 0..INTRADAY_BARS {
        let hour = now - Duration::hours(INTRADAY_BARS - i);
        series.insert(
            hour.format("%Y-%m-%d %H:%M:%S").to_string(),
            random_bar(base_price(symbol), &INTRADAY_JITTER),
        );
    }

    envelope(symbol, "Intraday", INTRADAY_SERIES_KEY.to_string(), series)
}

fn random_bar(base: f64, j: &Jitter) -> Value {
    let open = base * (1.0 + rand::random_range(-j.open..j.open));
    let close = open * (1.0 + rand::random_range(-j.close..j.close));
    let high = open.max(close) * (1.0 + rand::random_range(j.wick.0..j.wick.1));
    let low = open.min(close) * (1.0 - rand::random_range(j.wick.0..j.wick.1));
    let volume = rand::random_range(j.volume.0..=j.volume.1);

    json!({
        "1. open": format!("{:.4}", open),
        "2. high": format!("{:.4}", high),
        "3. low": format!("{:.4}", low),
        "4. close": format!("{:.4}", close),
        "5. volume": volume.to_string(),
    })
}

fn envelope(symbol: &str, kind: &str, series_key: String, series: Map<String, Value>) -> Value {
    let mut root = Map::new();
    root.insert(
        "Meta Data".to_string(),
        json!({
            "1. Information": format!("{} Prices (open, high, low, close) and Volumes", kind),
            "2. Symbol": symbol,
            "3. Last Refreshed": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "4. Output Size": "Compact",
            "5. Time Zone": "US/Eastern",
        }),
    );
    root.insert(series_key, Value::Object(series));
    Value::Object(root)
}
