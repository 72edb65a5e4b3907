use config::{Config, ConfigError, Environment, File};
use infrastructure::MonitoringConfig;
use serde::Deserialize;

use crate::adapter::{emoncms::Emoncms, homeassistant::HomeAssistant, pushover::Pushover};
use crate::automation::{climate::ClimateConfig, hot_water::HotWaterConfig};
use crate::bridge::{AmberConfig, ClimateTelemetryConfig, RelayTelemetryConfig, SolarEdgeConfig};
use crate::core::{Error, MarkerFeed, Result};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    pub emoncms: Emoncms,
    pub homeassistant: Option<HomeAssistant>,
    pub pushover: Option<Pushover>,
    pub climate: Option<ClimateConfig>,
    pub hot_water: Option<HotWaterConfig>,
    pub relay_telemetry: Option<RelayTelemetryConfig>,
    pub amber: Option<AmberConfig>,
    pub climate_telemetry: Option<ClimateTelemetryConfig>,
    pub solaredge: Option<SolarEdgeConfig>,
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(
                Environment::with_prefix("EMON")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("hot_water.feeds.batteries")
                    .try_parsing(true),
            );

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Checks what deserialization cannot. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            return Err(Error::config("http_timeout_secs must be positive"));
        }
        non_empty("emoncms.url", &self.emoncms.url)?;

        if let Some(homeassistant) = &self.homeassistant {
            non_empty("homeassistant.url", &homeassistant.url)?;
        }

        if let Some(climate) = &self.climate {
            if self.homeassistant.is_none() {
                return Err(Error::config("climate requires a homeassistant section"));
            }
            non_empty("climate.entity_id", &climate.entity_id)?;
            positive("climate.interval_secs", climate.interval_secs)?;
            climate.feeds.markers().into_iter().try_for_each(valid_marker)?;
        }

        if let Some(hot_water) = &self.hot_water {
            non_empty("hot_water.shelly_url", &hot_water.shelly_url)?;
            positive("hot_water.interval_secs", hot_water.interval_secs)?;
            if hot_water.relay_load_watts < 0.0 {
                return Err(Error::config("hot_water.relay_load_watts must not be negative"));
            }
        }

        if let Some(telemetry) = &self.relay_telemetry {
            non_empty("relay_telemetry.shelly_url", &telemetry.shelly_url)?;
            positive("relay_telemetry.interval_secs", telemetry.interval_secs)?;
        }

        if let Some(amber) = &self.amber {
            non_empty("amber.site_id", &amber.site_id)?;
            positive("amber.interval_secs", amber.interval_secs)?;
        }

        if let Some(telemetry) = &self.climate_telemetry {
            if self.homeassistant.is_none() {
                return Err(Error::config("climate_telemetry requires a homeassistant section"));
            }
            non_empty("climate_telemetry.entity_id", &telemetry.entity_id)?;
            non_empty("climate_telemetry.node", &telemetry.node)?;
            positive("climate_telemetry.interval_secs", telemetry.interval_secs)?;
        }

        if let Some(solaredge) = &self.solaredge {
            non_empty("solaredge.host", &solaredge.host)?;
            non_empty("solaredge.phase", &solaredge.phase)?;
            positive("solaredge.interval_secs", solaredge.interval_secs)?;
            if !solaredge.inverter && !solaredge.meter {
                return Err(Error::config("solaredge needs the inverter or the meter enabled"));
            }
        }

        let loops = [
            self.climate.is_some(),
            self.hot_water.is_some(),
            self.relay_telemetry.is_some(),
            self.amber.is_some(),
            self.climate_telemetry.is_some(),
            self.solaredge.is_some(),
        ];
        if !loops.contains(&true) {
            return Err(Error::config("nothing to run, configure at least one loop"));
        }

        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("{} must not be empty", key)));
    }
    Ok(())
}

fn positive(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::config(format!("{} must be positive", key)));
    }
    Ok(())
}

fn valid_marker(marker: &MarkerFeed) -> Result<()> {
    non_empty(&format!("input of {}", marker.feed), &marker.input)
}
