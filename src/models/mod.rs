use chrono::NaiveDateTime;

/// Text format for every timestamp written to an export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Fetch timestamps keep sub-second precision.
pub const FETCHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ── Weather ───────────────────────────────────────────────────────────────────

/// A temperature as reported by the source plus its derived Fahrenheit value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Temperature {
    pub celsius: Option<f64>,
    pub fahrenheit: Option<f64>,
}

impl Temperature {
    pub fn from_source(value: Option<f64>) -> Self {
        Self {
            celsius: value,
            fahrenheit: to_fahrenheit(value),
        }
    }
}

/// `value × 9/5 + 32`; null in, null out.
pub fn to_fahrenheit(value: Option<f64>) -> Option<f64> {
    value.map(|c| c * 9.0 / 5.0 + 32.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub temp: Temperature,
    pub feels_like: Temperature,
    pub temp_min: Temperature,
    pub temp_max: Temperature,
    pub pressure: Option<i64>,  // hPa
    pub humidity: Option<i64>,  // percent
    pub wind_speed: Option<f64>, // m/s
    pub recorded_at: Option<NaiveDateTime>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub fetched_at: NaiveDateTime,
}

// ── Finance ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FinanceBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub fetched_at: NaiveDateTime,
}

/// Which Alpha Vantage series to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Interval {
    #[default]
    Daily,
    Intraday,
}

impl Interval {
    /// Case-insensitive; anything that is not "intraday" means daily.
    pub fn from_answer(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("intraday") {
            Interval::Intraday
        } else {
            Interval::Daily
        }
    }
}

/// Inclusive timestamp bounds applied to finance bars before export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start.is_none_or(|s| *ts >= s) && self.end.is_none_or(|e| *ts <= e)
    }
}

/// Per-symbol diagnostics from one finance normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinanceTally {
    pub seen: usize,
    pub filtered: usize,
    pub skipped: usize,
    pub written: usize,
}

// ── Run summary ───────────────────────────────────────────────────────────────

/// Outcome of exporting one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainReport {
    pub items_requested: usize,
    pub items_failed: usize,
    pub items_synthetic: usize,
    pub rows_written: usize,
}

/// Running row counts for one run; printed once, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub weather: Option<DomainReport>,
    pub finance: Option<DomainReport>,
}

impl ExportSummary {
    pub fn total_rows(&self) -> usize {
        [&self.weather, &self.finance]
            .into_iter()
            .flatten()
            .map(|r| r.rows_written)
            .sum()
    }
}
