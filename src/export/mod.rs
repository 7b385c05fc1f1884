//! Delimited-text export: one file per domain, fixed header, one row per
//! normalized record.

use crate::models::{FETCHED_AT_FORMAT, FinanceBar, TIMESTAMP_FORMAT, WeatherObservation};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

// ── Columns ───────────────────────────────────────────────────────────────────

pub const WEATHER_HEADER: [&str; 18] = [
    "City",
    "Country",
    "Description",
    "Temp_C",
    "Temp_F",
    "FeelsLike_C",
    "FeelsLike_F",
    "MinTemp_C",
    "MinTemp_F",
    "MaxTemp_C",
    "MaxTemp_F",
    "Pressure",
    "Humidity",
    "WindSpeed",
    "Time_of_Record",
    "Sunrise",
    "Sunset",
    "fetched_at_utc",
];

pub const FINANCE_HEADER: [&str; 8] = [
    "Symbol",
    "Datetime",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "fetched_at_utc",
];

/// A record with a fixed column layout. Null fields render as empty cells.
pub trait CsvRow {
    const HEADER: &'static [&'static str];

    fn to_record(&self) -> Vec<String>;
}

fn cell<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(T::to_string).unwrap_or_default()
}

/// Floats always carry a fractional part: `10.0`, not `10`.
fn float_text(v: f64) -> String {
    format!("{:?}", v)
}

fn float_cell(v: &Option<f64>) -> String {
    v.map(float_text).unwrap_or_default()
}

fn time_cell(v: &Option<NaiveDateTime>) -> String {
    v.map(|t| t.format(TIMESTAMP_FORMAT).to_string()).unwrap_or_default()
}

impl CsvRow for WeatherObservation {
    const HEADER: &'static [&'static str] = &WEATHER_HEADER;

    fn to_record(&self) -> Vec<String> {
        vec![
            cell(&self.city),
            cell(&self.country),
            cell(&self.description),
            float_cell(&self.temp.celsius),
            float_cell(&self.temp.fahrenheit),
            float_cell(&self.feels_like.celsius),
            float_cell(&self.feels_like.fahrenheit),
            float_cell(&self.temp_min.celsius),
            float_cell(&self.temp_min.fahrenheit),
            float_cell(&self.temp_max.celsius),
            float_cell(&self.temp_max.fahrenheit),
            cell(&self.pressure),
            cell(&self.humidity),
            float_cell(&self.wind_speed),
            time_cell(&self.recorded_at),
            time_cell(&self.sunrise),
            time_cell(&self.sunset),
            self.fetched_at.format(FETCHED_AT_FORMAT).to_string(),
        ]
    }
}

impl CsvRow for FinanceBar {
    const HEADER: &'static [&'static str] = &FINANCE_HEADER;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.symbol.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            float_text(self.open),
            float_text(self.high),
            float_text(self.low),
            float_text(self.close),
            self.volume.to_string(),
            self.fetched_at.format(FETCHED_AT_FORMAT).to_string(),
        ]
    }
}

// ── Exporter ──────────────────────────────────────────────────────────────────

/// Owns the output handle for one domain. The file is flushed and closed
/// when the exporter is dropped, including on early returns. Rows are
/// typed, so only records matching the written header can be appended.
pub struct CsvExporter<W: Write, R: CsvRow> {
    writer: csv::Writer<W>,
    rows: usize,
    _row: PhantomData<fn(&R)>,
}

impl<R: CsvRow> CsvExporter<File, R> {
    /// Create (truncate) `path` and write the header for `R`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        debug!("Writing {:?}", path);
        Self::from_writer(file)
    }
}

impl<W: Write, R: CsvRow> CsvExporter<W, R> {
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(R::HEADER).context("Failed to write CSV header")?;
        Ok(Self { writer, rows: 0, _row: PhantomData })
    }

    pub fn append(&mut self, row: &R) -> Result<()> {
        self.writer
            .write_record(row.to_record())
            .context("Failed to write CSV row")?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}
