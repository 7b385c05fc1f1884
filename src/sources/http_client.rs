use crate::error::Result;
use anyhow::Context;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Status and raw body of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Thin reqwest wrapper shared by the source adapters. One request per
/// call, no retries.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout_secs: Option<u64>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .cookie_store(true);

        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let inner = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { inner })
    }

    /// Transport failures map to `EtlError::Unknown`.
    pub async fn get(&self, url: Url) -> Result<HttpReply> {
        debug!("GET {}", redact(&url));

        let resp = self.inner.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(HttpReply { status, body })
    }
}

/// URL for logging with API keys masked.
pub fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k.eq_ignore_ascii_case("apikey") || k.eq_ignore_ascii_case("appid") {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    if pairs.is_empty() {
        return masked.to_string();
    }
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_masks_keys_only() {
        let url = Url::parse_with_params(
            "https://example.test/query",
            &[("symbol", "IBM"), ("apikey", "secret")],
        )
        .unwrap();
        assert_eq!(redact(&url), "https://example.test/query?symbol=IBM&apikey=***");

        let url = Url::parse("http://example.test/weather?q=London&appid=abc").unwrap();
        assert_eq!(redact(&url), "http://example.test/weather?q=London&appid=***");
    }
}
