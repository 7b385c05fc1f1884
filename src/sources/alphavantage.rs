use crate::config::FinanceConfig;
use crate::error::{EtlError, Result};
use crate::sources::http_client::{HttpClient, HttpReply};
use crate::sources::{FallbackPolicy, FallbackReason, FinanceSource, Fetched, synthetic};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

const PROVIDER: &str = "Alpha Vantage";

/// Top-level keys Alpha Vantage uses for non-fatal notices.
const ADVISORY_KEYS: [&str; 2] = ["Note", "Information"];

pub struct AlphaVantageClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    output_size: String,
    fallback: FallbackPolicy,
}

impl AlphaVantageClient {
    pub fn new(config: &FinanceConfig, fallback: FallbackPolicy) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpClient::new(&config.user_agent, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            output_size: config.output_size.clone(),
            fallback,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn series_url(
        &self,
        function: &str,
        symbol: &str,
        granularity: Option<&str>,
        api_key: &str,
    ) -> Result<Url> {
        let mut params = vec![("function", function), ("symbol", symbol)];
        if let Some(g) = granularity {
            params.push(("interval", g));
        }
        params.push(("outputsize", self.output_size.as_str()));
        params.push(("apikey", api_key));

        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| EtlError::Config(format!("bad finance base URL {:?}: {}", self.base_url, e)))
    }

    async fn fetch_series(
        &self,
        function: &str,
        symbol: &str,
        granularity: Option<&str>,
        make_synthetic: impl FnOnce() -> Value,
    ) -> Result<Fetched> {
        let Some(api_key) = self.api_key.as_deref() else {
            return self
                .fallback
                .recover(PROVIDER, FallbackReason::MissingCredential, make_synthetic);
        };

        let live = async {
            let url = self.series_url(function, symbol, granularity, api_key)?;
            let reply = self.client.get(url).await?;
            classify_reply(symbol, &reply)
        };

        match live.await {
            Ok(payload) => {
                debug!("{}: live {} payload", symbol, function);
                let advisory = advisory(&payload);
                Ok(Fetched::live(payload).with_advisory(advisory))
            }
            Err(e) => self.fallback.recover(PROVIDER, FallbackReason::Failed(e), make_synthetic),
        }
    }
}

/// Non-200 → `Upstream`; an "Error Message" field → `NotFound`.
pub fn classify_reply(symbol: &str, reply: &HttpReply) -> Result<Value> {
    if reply.status != 200 {
        return Err(EtlError::Upstream { status: reply.status });
    }
    let data: Value = serde_json::from_str(&reply.body)?;
    if data.get("Error Message").is_some() {
        return Err(EtlError::not_found("Symbol", symbol));
    }
    Ok(data)
}

/// Rate-limit and similar notices carried alongside (or instead of) data.
pub fn advisory(payload: &Value) -> Option<String> {
    ADVISORY_KEYS
        .iter()
        .find_map(|k| payload.get(*k))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

#[async_trait]
impl FinanceSource for AlphaVantageClient {
    async fn fetch_daily(&self, symbol: &str) -> Result<Fetched> {
        self.fetch_series("TIME_SERIES_DAILY", symbol, None, || synthetic::daily(symbol))
            .await
    }

    async fn fetch_intraday(&self, symbol: &str, granularity: &str) -> Result<Fetched> {
        self.fetch_series("TIME_SERIES_INTRADAY", symbol, Some(granularity), || {
            synthetic::intraday(symbol)
        })
        .await
    }
}
