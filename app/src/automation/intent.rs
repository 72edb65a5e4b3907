use crate::core::{
    Result,
    unit::{ClimateMode, PowerState},
};
use crate::port::Actuator;

/// What a tick wants the actuator to look like. Fields left empty are not touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActuationIntent {
    pub power: Option<PowerState>,
    pub mode: Option<ClimateMode>,
    pub remember: Option<Remember>,
    pub notification: Option<String>,
}

/// Marker written right before actuating, so the previous state can be restored later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remember {
    PreAwayPower(PowerState),
    PreSpikeMode(ClimateMode),
}

impl ActuationIntent {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn power(power: PowerState) -> Self {
        Self {
            power: Some(power),
            ..Self::default()
        }
    }

    pub fn mode(mode: ClimateMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn remembering(mut self, remember: Remember) -> Self {
        self.remember = Some(remember);
        self
    }

    pub fn notifying(mut self, message: impl Into<String>) -> Self {
        self.notification = Some(message.into());
        self
    }

    pub fn is_noop(&self) -> bool {
        self.power.is_none() && self.mode.is_none()
    }
}

/// How a completed tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disabled,
    Unchanged,
    Actuated,
}

impl TickOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            TickOutcome::Disabled => "disabled",
            TickOutcome::Unchanged => "unchanged",
            TickOutcome::Actuated => "actuated",
        }
    }
}

/// Power the actuator has to be switched to, compared against a fresh read of the device.
/// `None` if nothing is requested or the device already matches.
pub async fn pending_power(actuator: &impl Actuator, intent: &ActuationIntent) -> Result<Option<PowerState>> {
    let Some(desired) = intent.power else {
        return Ok(None);
    };

    let current = actuator.get_power().await?;
    Ok((current != desired).then_some(desired))
}
