use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub finance: FinanceConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// OpenWeatherMap adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Unset means the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_weather_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Alpha Vantage adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FinanceConfig {
    #[serde(default = "default_finance_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_finance_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_intraday_granularity")]
    pub intraday_granularity: String,

    #[serde(default = "default_output_size")]
    pub output_size: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Output file locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_weather_path")]
    pub weather_path: PathBuf,

    #[serde(default = "default_finance_path")]
    pub finance_path: PathBuf,
}

/// Synthetic-data fallback switch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    #[serde(default = "default_true")]
    pub synthetic: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_weather_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}
fn default_finance_url() -> String {
    "https://www.alphavantage.co/query".to_string()
}
fn default_weather_delay_ms() -> u64 {
    1_000
}
fn default_finance_delay_ms() -> u64 {
    12_000
}
fn default_intraday_granularity() -> String {
    "60min".to_string()
}
fn default_output_size() -> String {
    "compact".to_string()
}
fn default_user_agent() -> String {
    "weather-finance-etl/0.1".to_string()
}
fn default_weather_path() -> PathBuf {
    PathBuf::from("WeatherData_combined.csv")
}
fn default_finance_path() -> PathBuf {
    PathBuf::from("FinanceData_combined.csv")
}
fn default_true() -> bool {
    true
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            api_key: None,
            timeout_secs: None,
            delay_ms: default_weather_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            base_url: default_finance_url(),
            api_key: None,
            timeout_secs: None,
            delay_ms: default_finance_delay_ms(),
            intraday_granularity: default_intraday_granularity(),
            output_size: default_output_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            weather_path: default_weather_path(),
            finance_path: default_finance_path(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { synthetic: true }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

pub const WEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";
pub const FINANCE_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("ETL").separator("__"))
            .build()?;

        let mut app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid configuration")?;
        app_cfg.apply_credentials(|name| std::env::var(name).ok());
        Ok(app_cfg)
    }

    /// Fill unset API keys from the provider's well-known variables and
    /// treat blank keys as absent.
    pub fn apply_credentials(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.weather.api_key.is_none() {
            self.weather.api_key = lookup(WEATHER_KEY_VAR);
        }
        if self.finance.api_key.is_none() {
            self.finance.api_key = lookup(FINANCE_KEY_VAR);
        }
        self.weather.api_key = non_blank(self.weather.api_key.take());
        self.finance.api_key = non_blank(self.finance.api_key.take());
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
