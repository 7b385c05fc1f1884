//! Pipeline orchestrator: ties sources → normalizers → CSV export together.
//!
//! ## Run shape
//!
//! Strictly sequential. For each city (or symbol): fetch, normalize, append
//! the row(s), then sleep the configured per-item delay before the next one.
//! The delay runs whether the payload was live or synthetic.
//!
//! A failure for one item is logged with its key and counted; the loop moves
//! on. Only output I/O errors and a missing finance adapter abort the run.

use crate::config::AppConfig;
use crate::error::EtlError;
use crate::export::CsvExporter;
use crate::models::{DateRange, DomainReport, ExportSummary, FinanceBar, Interval, WeatherObservation};
use crate::sources::{FinanceSource, Fetched, PayloadOrigin, WeatherSource};
use crate::transform::{normalize_time_series, normalize_weather};
use crate::utils::Timer;
use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinanceRequest {
    pub interval: Interval,
    pub range: DateRange,
}

/// One resolved export run, from the command line or the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    Weather {
        cities: Vec<String>,
        out: PathBuf,
    },
    Finance {
        symbols: Vec<String>,
        request: FinanceRequest,
        out: PathBuf,
    },
    Both {
        cities: Vec<String>,
        symbols: Vec<String>,
        request: FinanceRequest,
        weather_out: PathBuf,
        finance_out: PathBuf,
    },
}

impl ExportRequest {
    fn needs_finance(&self) -> bool {
        !matches!(self, ExportRequest::Weather { .. })
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub weather_delay: Duration,
    pub finance_delay: Duration,
    pub intraday_granularity: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            weather_delay: Duration::from_millis(config.weather.delay_ms),
            finance_delay: Duration::from_millis(config.finance.delay_ms),
            intraday_granularity: config.finance.intraday_granularity.clone(),
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline<'a> {
    weather: &'a dyn WeatherSource,
    finance: Option<&'a dyn FinanceSource>,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        weather: &'a dyn WeatherSource,
        finance: Option<&'a dyn FinanceSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self { weather, finance, settings }
    }

    pub async fn run(&self, request: &ExportRequest) -> Result<ExportSummary> {
        if request.needs_finance() && self.finance.is_none() {
            return Err(EtlError::Config(
                "finance source not configured; set ALPHAVANTAGE_API_KEY or enable the synthetic fallback"
                    .to_string(),
            )
            .into());
        }

        let mut summary = ExportSummary::default();

        match request {
            ExportRequest::Weather { cities, out } => {
                summary.weather = self.export_weather(cities, out).await?;
            }
            ExportRequest::Finance { symbols, request, out } => {
                summary.finance = self.export_finance(symbols, request, out).await?;
            }
            ExportRequest::Both { cities, symbols, request, weather_out, finance_out } => {
                summary.weather = self.export_weather(cities, weather_out).await?;
                summary.finance = self.export_finance(symbols, request, finance_out).await?;
            }
        }

        info!("=== Done: {} rows written ===", summary.total_rows());
        Ok(summary)
    }

    /// Returns `None` (and writes nothing) for an empty city list.
    pub async fn export_weather(&self, cities: &[String], out: &Path) -> Result<Option<DomainReport>> {
        if cities.is_empty() {
            warn!("No valid cities provided for weather data.");
            return Ok(None);
        }

        let _t = Timer::start(format!("Weather export ({} cities)", cities.len()));
        let mut exporter = CsvExporter::<_, WeatherObservation>::create(out)?;
        let mut report = DomainReport { items_requested: cities.len(), ..Default::default() };

        for city in cities {
            info!("Fetching weather for: {}", city);

            match self.weather.current_weather(city).await {
                Ok(fetched) => {
                    note_origin(city, &fetched, &mut report);
                    match normalize_weather(&fetched.payload, Utc::now().naive_utc()) {
                        Ok(obs) => {
                            exporter.append(&obs)?;
                            info!("Successfully fetched data for {}", city);
                        }
                        Err(e) => {
                            warn!("Error processing data for {}: {}", city, e);
                            report.items_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", city, e);
                    report.items_failed += 1;
                }
            }

            sleep(self.settings.weather_delay).await;
        }

        let rows = exporter.rows_written();
        exporter.finish()?;
        report.rows_written = rows;
        info!("Total weather records written: {} ({:?})", rows, out);
        Ok(Some(report))
    }

    /// Returns `None` (and writes nothing) for an empty symbol list.
    pub async fn export_finance(
        &self,
        symbols: &[String],
        request: &FinanceRequest,
        out: &Path,
    ) -> Result<Option<DomainReport>> {
        let Some(finance) = self.finance else {
            return Err(EtlError::Config("finance source not configured".to_string()).into());
        };
        if symbols.is_empty() {
            warn!("No valid symbols provided for finance data.");
            return Ok(None);
        }

        let _t = Timer::start(format!("Finance export ({} symbols)", symbols.len()));
        if let Some(start) = request.range.start {
            info!("Filtering from: {}", start);
        }
        if let Some(end) = request.range.end {
            info!("Filtering until: {}", end);
        }

        let mut exporter = CsvExporter::<_, FinanceBar>::create(out)?;
        let mut report = DomainReport { items_requested: symbols.len(), ..Default::default() };

        for symbol in symbols {
            info!("Fetching {:?} time series for: {}", request.interval, symbol);

            let fetched = match request.interval {
                Interval::Daily => finance.fetch_daily(symbol).await,
                Interval::Intraday => {
                    finance
                        .fetch_intraday(symbol, &self.settings.intraday_granularity)
                        .await
                }
            };

            match fetched {
                Ok(fetched) => {
                    note_origin(symbol, &fetched, &mut report);
                    self.write_bars(symbol, &fetched, &request.range, &mut exporter, &mut report)?;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    report.items_failed += 1;
                }
            }

            sleep(self.settings.finance_delay).await;
        }

        let rows = exporter.rows_written();
        exporter.finish()?;
        report.rows_written = rows;
        info!("Total finance records written: {} ({:?})", rows, out);
        if rows == 0 {
            warn!(
                "No finance data written. Possible causes: API rate limits, invalid symbols, \
                 a date range outside the available data, or API key issues."
            );
        }
        Ok(Some(report))
    }

    fn write_bars(
        &self,
        symbol: &str,
        fetched: &Fetched,
        range: &DateRange,
        exporter: &mut CsvExporter<std::fs::File, FinanceBar>,
        report: &mut DomainReport,
    ) -> Result<()> {
        let batch = match normalize_time_series(symbol, &fetched.payload, range, Utc::now().naive_utc()) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("{}", e);
                report.items_failed += 1;
                return Ok(());
            }
        };

        for bar in &batch.bars {
            exporter.append(bar)?;
        }

        let t = batch.tally;
        info!(
            "Summary for {}: {} processed, {} filtered, {} skipped, {} written",
            symbol, t.seen, t.filtered, t.skipped, t.written
        );
        if t.written == 0 && t.seen > 0 {
            if let Some((first, last)) = &batch.available {
                warn!(
                    "{}: all records were filtered out; data available from {} to {}",
                    symbol, first, last
                );
            }
        }
        Ok(())
    }
}

/// Log synthetic substitution and upstream notices; count synthetic items.
fn note_origin(key: &str, fetched: &Fetched, report: &mut DomainReport) {
    if let PayloadOrigin::Synthetic(reason) = &fetched.origin {
        warn!("{}: using synthetic data ({})", key, reason);
        report.items_synthetic += 1;
    }
    if let Some(note) = &fetched.advisory {
        warn!("{}: API note: {}", key, note);
    }
}
