use anyhow::Context;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::core::{Error, Result, unit::PowerState};
use crate::port::Actuator;

/// Relay of a first generation Shelly device, controlled through its local HTTP API
#[derive(Debug, Clone)]
pub struct ShellyRelay {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShellyStatus {
    pub relays: Vec<RelayStatus>,
    #[serde(default)]
    pub meters: Vec<MeterStatus>,
    pub temperature: Option<f64>,
    pub wifi_sta: Option<WifiStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayStatus {
    pub ison: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeterStatus {
    pub power: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WifiStatus {
    pub rssi: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ShellySettings {
    name: Option<String>,
    device: Option<DeviceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
struct DeviceSettings {
    hostname: String,
}

impl ShellyStatus {
    pub fn relay_on(&self) -> Option<bool> {
        self.relays.first().map(|r| r.ison)
    }

    pub fn power(&self) -> Option<f64> {
        self.meters.first().map(|m| m.power)
    }

    pub fn rssi(&self) -> Option<i64> {
        self.wifi_sta.as_ref().and_then(|w| w.rssi)
    }
}

impl ShellyRelay {
    pub fn new(url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = HttpClientConfig::anonymous()
            .with_timeout_secs(timeout_secs)
            .new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }

    pub async fn status(&self) -> anyhow::Result<ShellyStatus> {
        self.client
            .get(format!("{}/status", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<ShellyStatus>()
            .await
            .context("Error reading Shelly status")
    }

    /// Configured device name, falling back to the hostname for unnamed devices
    pub async fn device_name(&self) -> anyhow::Result<String> {
        let settings = self
            .client
            .get(format!("{}/settings", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<ShellySettings>()
            .await
            .context("Error reading Shelly settings")?;

        settings_name(settings).context("Shelly device has neither name nor hostname")
    }
}

fn settings_name(settings: ShellySettings) -> Option<String> {
    settings
        .name
        .filter(|name| !name.is_empty())
        .or(settings.device.map(|d| d.hostname))
}

impl Actuator for ShellyRelay {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn get_power(&self) -> Result<PowerState> {
        let status = self
            .status()
            .await
            .map_err(|e| Error::device(&self.base_url, format!("{:#}", e)))?;

        status
            .relay_on()
            .map(PowerState::from)
            .ok_or_else(|| Error::device(&self.base_url, "status reports no relay"))
    }

    #[tracing::instrument(skip(self), fields(relay = %self.base_url))]
    async fn set_power(&self, power: PowerState) -> Result<()> {
        let relay = self
            .client
            .post(format!("{}/relay/0", self.base_url))
            .query(&[("turn", power.to_string())])
            .send()
            .await
            .map_err(|e| Error::device(&self.base_url, e))?
            .error_for_status()
            .map_err(|e| Error::device(&self.base_url, e))?
            .json::<RelayStatus>()
            .await
            .map_err(|e| Error::device(&self.base_url, e))?;

        if PowerState::from(relay.ison) != power {
            return Err(Error::device(
                &self.base_url,
                format!("relay did not switch {}", power),
            ));
        }

        Ok(())
    }
}
