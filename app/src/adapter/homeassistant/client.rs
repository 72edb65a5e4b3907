use anyhow::Context;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;

use super::EntityState;

#[derive(Debug, Clone)]
pub struct HaHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HaHttpClient {
    pub fn new(url: &str, token: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(Some(token.to_owned()))
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }
}

impl HaHttpClient {
    pub async fn get_state(&self, entity_id: &str) -> anyhow::Result<EntityState> {
        let response = self
            .client
            .get(format!("{}/api/states/{}", self.base_url, entity_id))
            .send()
            .await?
            .error_for_status()?;

        response
            .json::<EntityState>()
            .await
            .with_context(|| format!("Error getting state of {}", entity_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
    ) -> anyhow::Result<()> {
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);

        tracing::info!("Calling HA service {}: {}", url, service_data);

        let response = self.client.post(url).json(&service_data).send().await?;
        let status = response.status();
        tracing::debug!("Response: {} - {}", status, response.text().await?);

        if !status.is_success() {
            anyhow::bail!("Service {}.{} failed with status {}", domain, service, status);
        }

        Ok(())
    }
}
