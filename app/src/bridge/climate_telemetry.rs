use serde::Deserialize;

use crate::adapter::homeassistant::{ClimateReading, HaClimate};
use crate::automation::{Tick, TickOutcome};
use crate::core::Result;
use crate::port::{Actuator, FeedStore};

pub const NAME: &str = "climate_telemetry";

#[derive(Debug, Clone, Deserialize)]
pub struct ClimateTelemetryConfig {
    pub entity_id: String,
    #[serde(default = "default_node")]
    pub node: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub health_check_url: Option<String>,
}

fn default_node() -> String {
    "AC_0".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

/// Publishes power, mode and temperatures of the air-conditioner
pub struct ClimateTelemetry<F: FeedStore> {
    climate: HaClimate,
    store: F,
    node: String,
}

impl<F: FeedStore> ClimateTelemetry<F> {
    pub fn new(climate: HaClimate, store: F, node: &str) -> Self {
        Self {
            climate,
            store,
            node: node.to_owned(),
        }
    }
}

impl<F: FeedStore> Tick for ClimateTelemetry<F> {
    #[tracing::instrument(skip(self), fields(device = self.climate.name()))]
    async fn tick(&self) -> Result<TickOutcome> {
        let reading = self.climate.reading().await?;
        let values = telemetry_values(&reading);
        tracing::debug!("Publishing {:?} to {}", values, self.node);

        if let Some(temperature) = reading.current_temperature {
            infrastructure::meter::set("climate_temperature", temperature, &[("node", self.node.as_str())]);
        }

        self.store.post(&self.node, &values).await?;
        Ok(TickOutcome::Unchanged)
    }
}

fn telemetry_values(reading: &ClimateReading) -> Vec<(&'static str, f64)> {
    let mut values = vec![("PowerState", reading.power.code() as f64)];

    if let Some(mode) = reading.mode {
        values.push(("Mode", mode.code() as f64));
    }
    if let Some(target) = reading.target_temperature {
        values.push(("TargetTemp", target));
    }
    if let Some(current) = reading.current_temperature {
        values.push(("CurrentTemp", current));
    }
    if let Some(speed) = reading.fan_mode.as_deref().and_then(fan_speed_code) {
        values.push(("FanSpeed", speed));
    }
    if let (Some(current), Some(target)) = (reading.current_temperature, reading.target_temperature) {
        values.push(("Delta", current - target));
    }

    values
}

fn fan_speed_code(fan_mode: &str) -> Option<f64> {
    match fan_mode.to_ascii_lowercase().as_str() {
        "auto" => Some(0.0),
        "low" => Some(1.0),
        "medium" | "mid" => Some(3.0),
        "high" => Some(5.0),
        _ => None,
    }
}
