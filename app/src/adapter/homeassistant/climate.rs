use serde_json::json;

use crate::core::{
    Error, Result,
    unit::{ClimateMode, PowerState},
};
use crate::port::{Actuator, ClimateActuator};

use super::{EntityState, HaHttpClient, StateValue};

/// What the entity reports beyond power and mode
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateReading {
    pub power: PowerState,
    pub mode: Option<ClimateMode>,
    pub target_temperature: Option<f64>,
    pub current_temperature: Option<f64>,
    pub fan_mode: Option<String>,
}

/// Air-conditioner exposed as a Home Assistant `climate` entity
pub struct HaClimate {
    client: HaHttpClient,
    entity_id: String,
}

impl HaClimate {
    pub fn new(client: HaHttpClient, entity_id: &str) -> Self {
        Self {
            client,
            entity_id: entity_id.to_owned(),
        }
    }

    async fn state(&self) -> Result<EntityState> {
        self.client
            .get_state(&self.entity_id)
            .await
            .map_err(|e| Error::device(&self.entity_id, format!("{:#}", e)))
    }

    pub async fn reading(&self) -> Result<ClimateReading> {
        let state = self.state().await?;
        reading_from_state(&state).map_err(|e| Error::device(&self.entity_id, e))
    }

    async fn call(&self, service: &str, data: serde_json::Value) -> Result<()> {
        self.client
            .call_service("climate", service, data)
            .await
            .map_err(|e| Error::device(&self.entity_id, format!("{:#}", e)))
    }
}

impl Actuator for HaClimate {
    fn name(&self) -> &str {
        &self.entity_id
    }

    async fn get_power(&self) -> Result<PowerState> {
        let state = self.state().await?;
        power_from_state(&state).map_err(|e| Error::device(&self.entity_id, e))
    }

    #[tracing::instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set_power(&self, power: PowerState) -> Result<()> {
        let service = if power.is_on() { "turn_on" } else { "turn_off" };
        self.call(service, json!({ "entity_id": self.entity_id })).await
    }
}

impl ClimateActuator for HaClimate {
    async fn get_mode(&self) -> Result<Option<ClimateMode>> {
        let state = self.state().await?;
        mode_from_state(&state).map_err(|e| Error::device(&self.entity_id, e))
    }

    #[tracing::instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set_mode(&self, mode: ClimateMode) -> Result<()> {
        self.call(
            "set_hvac_mode",
            json!({
                "entity_id": self.entity_id,
                "hvac_mode": hvac_mode(mode),
            }),
        )
        .await
    }
}

fn available_state(state: &EntityState) -> std::result::Result<&str, String> {
    match &state.state {
        StateValue::Available(value) => Ok(value.as_str()),
        StateValue::Unavailable => Err(format!("{} is unavailable", state.entity_id)),
    }
}

fn power_from_state(state: &EntityState) -> std::result::Result<PowerState, String> {
    available_state(state).map(|value| PowerState::from(value != "off"))
}

fn mode_from_state(state: &EntityState) -> std::result::Result<Option<ClimateMode>, String> {
    let mode = match available_state(state)? {
        "off" => None,
        "cool" => Some(ClimateMode::Cool),
        "fan_only" => Some(ClimateMode::Fan),
        "dry" => Some(ClimateMode::Dry),
        "heat" => Some(ClimateMode::Heat),
        "heat_cool" | "auto" => match state.attribute_str("hvac_action") {
            Some("heating") => Some(ClimateMode::AutoHeat),
            _ => Some(ClimateMode::AutoCool),
        },
        other => return Err(format!("unsupported hvac mode {}", other)),
    };

    Ok(mode)
}

fn reading_from_state(state: &EntityState) -> std::result::Result<ClimateReading, String> {
    Ok(ClimateReading {
        power: power_from_state(state)?,
        mode: mode_from_state(state)?,
        target_temperature: state.attribute_f64("temperature"),
        current_temperature: state.attribute_f64("current_temperature"),
        fan_mode: state.attribute_str("fan_mode").map(str::to_owned),
    })
}

fn hvac_mode(mode: ClimateMode) -> &'static str {
    match mode {
        ClimateMode::Cool => "cool",
        ClimateMode::Fan => "fan_only",
        ClimateMode::Dry => "dry",
        ClimateMode::Heat => "heat",
        ClimateMode::AutoCool | ClimateMode::AutoHeat => "heat_cool",
    }
}
