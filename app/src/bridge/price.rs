use serde::Deserialize;

use crate::adapter::amber::{AmberClient, ChannelType, PriceInterval};
use crate::automation::{Tick, TickOutcome};
use crate::core::{Error, Result};
use crate::port::FeedStore;

pub const NAME: &str = "price";

#[derive(Debug, Clone, Deserialize)]
pub struct AmberConfig {
    #[serde(default = "default_url")]
    pub url: String,
    pub site_id: String,
    pub api_key: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_node")]
    pub node: String,
    pub health_check_url: Option<String>,
}

fn default_url() -> String {
    "https://api.amber.com.au".to_string()
}

fn default_interval_secs() -> u64 {
    275
}

fn default_node() -> String {
    "PRICES".to_string()
}

/// Publishes current prices and the spike flag the climate automation reacts to
pub struct PriceBridge<F: FeedStore> {
    client: AmberClient,
    store: F,
    node: String,
}

impl<F: FeedStore> PriceBridge<F> {
    pub fn new(client: AmberClient, store: F, node: &str) -> Self {
        Self {
            client,
            store,
            node: node.to_owned(),
        }
    }
}

impl<F: FeedStore> Tick for PriceBridge<F> {
    #[tracing::instrument(skip(self))]
    async fn tick(&self) -> Result<TickOutcome> {
        let prices = self
            .client
            .current_prices()
            .await
            .map_err(|e| Error::unavailable("amber", format!("{:#}", e)))?;

        let values = price_values(&prices)?;
        tracing::debug!("Publishing prices {:?}", values);

        for (name, value) in &values {
            infrastructure::meter::set("energy_price", *value, &[("input", *name)]);
        }

        self.store.post(&self.node, &values).await?;
        Ok(TickOutcome::Unchanged)
    }
}

fn price_values(prices: &[PriceInterval]) -> Result<Vec<(&'static str, f64)>> {
    let channel = |channel_type: ChannelType| {
        prices
            .iter()
            .find(|p| p.channel_type == channel_type)
            .ok_or_else(|| Error::unavailable("amber", format!("no {:?} price in response", channel_type)))
    };

    let general = channel(ChannelType::General)?;
    let feed_in = channel(ChannelType::FeedIn)?;

    Ok(vec![
        ("SPIKE-STATUS", if general.is_spike() { 1.0 } else { 0.0 }),
        ("RENEWABLES", feed_in.renewables),
        //feed-in prices are negative when exporting earns money
        ("AMBER-SOLAR", -feed_in.per_kwh),
        ("AMBER-IMPORT", general.per_kwh),
    ])
}
