use anyhow::Context;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

/// Client of the Amber Electric price API
#[derive(Debug, Clone)]
pub struct AmberClient {
    client: ClientWithMiddleware,
    base_url: String,
    site_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelType {
    General,
    FeedIn,
    ControlledLoad,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInterval {
    pub channel_type: ChannelType,
    pub per_kwh: f64,
    #[serde(default)]
    pub renewables: f64,
    pub spike_status: Option<String>,
}

impl PriceInterval {
    pub fn is_spike(&self) -> bool {
        !matches!(self.spike_status.as_deref(), None | Some("none"))
    }
}

impl AmberClient {
    pub fn new(url: &str, site_id: &str, api_key: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(Some(api_key.to_owned()))
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
            site_id: site_id.to_owned(),
        })
    }

    pub async fn current_prices(&self) -> anyhow::Result<Vec<PriceInterval>> {
        self.client
            .get(format!("{}/v1/sites/{}/prices/current", self.base_url, self.site_id))
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<PriceInterval>>()
            .await
            .context("Error parsing Amber prices")
    }
}
