use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;

use crate::port::{HealthSink, HealthStatus};

/// Ping endpoint of a healthchecks.io check
pub struct HealthcheckPing {
    client: ClientWithMiddleware,
    check_url: String,
}

impl HealthcheckPing {
    pub fn new(check_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = HttpClientConfig::anonymous()
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(Self {
            client,
            check_url: check_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url_for(&self, status: HealthStatus) -> String {
        match status {
            HealthStatus::Success => self.check_url.clone(),
            HealthStatus::Fail => format!("{}/fail", self.check_url),
        }
    }
}

impl HealthSink for HealthcheckPing {
    async fn ping(&self, status: HealthStatus) -> anyhow::Result<()> {
        self.client
            .post(self.url_for(status))
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(%status, "Health ping sent");
        Ok(())
    }
}
