use crate::config::WeatherConfig;
use crate::error::{EtlError, Result};
use crate::sources::http_client::{HttpClient, HttpReply};
use crate::sources::{FallbackPolicy, FallbackReason, Fetched, WeatherSource, synthetic};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

const PROVIDER: &str = "OpenWeatherMap";

pub struct OpenWeatherClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    fallback: FallbackPolicy,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig, fallback: FallbackPolicy) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpClient::new(&config.user_agent, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            fallback,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// `{base}?q={city}&appid={key}`
    fn weather_url(&self, city: &str, api_key: &str) -> Result<Url> {
        Url::parse_with_params(&self.base_url, &[("q", city), ("appid", api_key)])
            .map_err(|e| EtlError::Config(format!("bad weather base URL {:?}: {}", self.base_url, e)))
    }

    async fn fetch_live(&self, city: &str, api_key: &str) -> Result<Value> {
        let url = self.weather_url(city, api_key)?;
        let reply = self.client.get(url).await?;
        classify_reply(city, &reply)
    }
}

/// 200 → decoded body, 404 → `NotFound`, other statuses → `Upstream`.
pub fn classify_reply(city: &str, reply: &HttpReply) -> Result<Value> {
    match reply.status {
        200 => Ok(serde_json::from_str(&reply.body)?),
        404 => Err(EtlError::not_found("City", city)),
        status => Err(EtlError::Upstream { status }),
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current_weather(&self, city: &str) -> Result<Fetched> {
        let Some(api_key) = self.api_key.as_deref() else {
            return self
                .fallback
                .recover(PROVIDER, FallbackReason::MissingCredential, || synthetic::weather(city));
        };

        match self.fetch_live(city, api_key).await {
            Ok(payload) => {
                debug!("{}: live weather payload", city);
                Ok(Fetched::live(payload))
            }
            Err(e) => self
                .fallback
                .recover(PROVIDER, FallbackReason::Failed(e), || synthetic::weather(city)),
        }
    }
}
