use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    bearer_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl HttpClientConfig {
    pub fn new(bearer_token: Option<String>) -> Self {
        Self {
            bearer_token,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds a client with bearer authentication (if any), a per-request timeout and
    /// tracing of every outgoing request.
    pub fn new_tracing_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.bearer_token {
            let mut auth_value = header::HeaderValue::from_str(format!("Bearer {}", token).as_str())?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout())
            .build()?;

        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_token_with_invalid_header_characters() {
        let config = HttpClientConfig::new(Some("line\nbreak".to_string()));

        assert!(config.new_tracing_client().is_err());
    }

    #[test]
    fn anonymous_client_uses_given_timeout() {
        let config = HttpClientConfig::anonymous().with_timeout_secs(2);

        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert!(config.new_tracing_client().is_ok());
    }
}
