use thiserror::Error;

/// Failures surfaced by the source adapters, the normalizers and the
/// request builders.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("Upstream API error: HTTP {status}")]
    Upstream { status: u16 },

    #[error("Unexpected error: {0}")]
    Unknown(String),

    #[error("No time series data found for {symbol} (keys: {})", .keys.join(", "))]
    NoTimeSeriesFound { symbol: String, keys: Vec<String> },

    #[error("No API key configured for {provider}")]
    MissingCredential { provider: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { kind, key: key.into() }
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        EtlError::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Unknown(format!("malformed response body: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_identifying_key() {
        let e = EtlError::not_found("City", "Atlantis");
        assert_eq!(e.to_string(), "City 'Atlantis' not found");

        let e = EtlError::NoTimeSeriesFound {
            symbol: "IBM".into(),
            keys: vec!["Meta Data".into(), "Note".into()],
        };
        assert_eq!(
            e.to_string(),
            "No time series data found for IBM (keys: Meta Data, Note)"
        );
    }
}
