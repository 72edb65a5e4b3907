use serde::Deserialize;

use crate::adapter::shelly::{ShellyRelay, ShellyStatus};
use crate::automation::{Tick, TickOutcome};
use crate::core::{Error, Result};
use crate::port::FeedStore;

pub const NAME: &str = "relay_telemetry";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayTelemetryConfig {
    pub shelly_url: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub health_check_url: Option<String>,
}

fn default_interval_secs() -> u64 {
    2
}

/// Publishes relay state and meter readings under a node named after the device
pub struct RelayTelemetry<F: FeedStore> {
    relay: ShellyRelay,
    store: F,
}

impl<F: FeedStore> RelayTelemetry<F> {
    pub fn new(relay: ShellyRelay, store: F) -> Self {
        Self { relay, store }
    }
}

impl<F: FeedStore> Tick for RelayTelemetry<F> {
    #[tracing::instrument(skip(self))]
    async fn tick(&self) -> Result<TickOutcome> {
        let name = self
            .relay
            .device_name()
            .await
            .map_err(|e| Error::device("shelly", format!("{:#}", e)))?;
        let status = self
            .relay
            .status()
            .await
            .map_err(|e| Error::device(name.as_str(), format!("{:#}", e)))?;

        let values = telemetry_values(&status).ok_or_else(|| Error::device(name.as_str(), "no relay reported"))?;
        tracing::debug!("Publishing {:?} for {}", values, name);

        if let Some((_, power)) = values.iter().find(|(key, _)| *key == "power") {
            infrastructure::meter::set("relay_power", *power, &[("device", name.as_str())]);
        }

        self.store.post(&name, &values).await?;
        Ok(TickOutcome::Unchanged)
    }
}

/// Values published for a status report. Readings the device does not report are left out.
fn telemetry_values(status: &ShellyStatus) -> Option<Vec<(&'static str, f64)>> {
    let relay = status.relay_on()?;

    let mut values = vec![("relay", if relay { 1.0 } else { 0.0 })];
    if let Some(power) = status.power() {
        values.push(("power", power));
    }
    if let Some(temperature) = status.temperature {
        values.push(("temperature", temperature));
    }
    if let Some(rssi) = status.rssi() {
        values.push(("rssi", rssi as f64));
    }

    Some(values)
}
