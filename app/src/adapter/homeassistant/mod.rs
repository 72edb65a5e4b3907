mod client;
mod climate;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use client::HaHttpClient;
pub use climate::{ClimateReading, HaClimate};

#[derive(Debug, Deserialize, Clone)]
pub struct HomeAssistant {
    pub url: String,
    pub token: String,
}

impl HomeAssistant {
    pub fn new_climate(&self, entity_id: &str, timeout_secs: u64) -> anyhow::Result<HaClimate> {
        let client = HaHttpClient::new(&self.url, &self.token, timeout_secs)?;
        Ok(HaClimate::new(client, entity_id))
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct EntityState {
    pub entity_id: String,
    pub state: StateValue,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EntityState {
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn attribute_f64(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Available(String),
    Unavailable,
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "unavailable" | "unknown" => Ok(StateValue::Unavailable),
            _ => Ok(StateValue::Available(value)),
        }
    }
}
