pub mod alphavantage;
pub mod http_client;
pub mod openweather;
pub mod synthetic;

pub use self::alphavantage::AlphaVantageClient;
pub use self::openweather::OpenWeatherClient;

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

// ── Source traits ─────────────────────────────────────────────────────────────

/// Current conditions by city name.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<Fetched>;
}

/// Daily and intraday OHLCV series by ticker symbol.
#[async_trait]
pub trait FinanceSource: Send + Sync {
    async fn fetch_daily(&self, symbol: &str) -> Result<Fetched>;
    async fn fetch_intraday(&self, symbol: &str, granularity: &str) -> Result<Fetched>;
}

// ── Fetch envelope ────────────────────────────────────────────────────────────

/// A decoded payload plus where it came from.
#[derive(Debug)]
pub struct Fetched {
    pub payload: Value,
    pub origin: PayloadOrigin,
    /// Non-fatal upstream notice (rate-limit "Note" and the like).
    pub advisory: Option<String>,
}

impl Fetched {
    pub fn live(payload: Value) -> Self {
        Self { payload, origin: PayloadOrigin::Live, advisory: None }
    }

    pub fn synthetic(payload: Value, reason: FallbackReason) -> Self {
        Self { payload, origin: PayloadOrigin::Synthetic(reason), advisory: None }
    }

    pub fn with_advisory(mut self, advisory: Option<String>) -> Self {
        self.advisory = advisory;
        self
    }
}

#[derive(Debug)]
pub enum PayloadOrigin {
    Live,
    Synthetic(FallbackReason),
}

/// Why synthetic data stood in for the real response. The suppressed error
/// is kept so callers can tell an outage from a missing key.
#[derive(Debug)]
pub enum FallbackReason {
    MissingCredential,
    Failed(EtlError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::MissingCredential => write!(f, "no API key configured"),
            FallbackReason::Failed(e) => write!(f, "request failed: {}", e),
        }
    }
}

// ── Fallback policy ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Substitute synthetic data for any missing key or failed call.
    Synthetic,
    /// Surface the underlying error instead.
    Strict,
}

impl FallbackPolicy {
    pub fn from_flag(synthetic: bool) -> Self {
        if synthetic { FallbackPolicy::Synthetic } else { FallbackPolicy::Strict }
    }

    /// Resolve a failed or impossible fetch according to the policy.
    pub fn recover(
        self,
        provider: &'static str,
        reason: FallbackReason,
        make_synthetic: impl FnOnce() -> Value,
    ) -> Result<Fetched> {
        match (self, reason) {
            (FallbackPolicy::Synthetic, reason) => Ok(Fetched::synthetic(make_synthetic(), reason)),
            (FallbackPolicy::Strict, FallbackReason::MissingCredential) => {
                Err(EtlError::MissingCredential { provider })
            }
            (FallbackPolicy::Strict, FallbackReason::Failed(e)) => Err(e),
        }
    }
}
