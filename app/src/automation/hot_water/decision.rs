use crate::core::unit::{PowerState, Watt};

use super::snapshot::{HotWaterSnapshot, SurplusState};

/// Load the element is assumed to draw while heating
pub const RELAY_LOAD: Watt = Watt(3600.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionParams {
    pub relay_load: Watt,
    pub battery_guard: bool,
}

pub fn decide(snapshot: &HotWaterSnapshot, params: &DecisionParams) -> PowerState {
    match snapshot {
        HotWaterSnapshot::AutomationDisabled => PowerState::On,
        HotWaterSnapshot::OutsideSchedule => PowerState::Off,
        HotWaterSnapshot::InSchedule(state) => decide_in_schedule(state, params),
    }
}

fn decide_in_schedule(state: &SurplusState, params: &DecisionParams) -> PowerState {
    let surplus = is_exporting(state, params.relay_load) || state.solar_price < 0.0 || state.forced;
    let blocked = state.away || (params.battery_guard && state.battery_flow.is_positive());

    PowerState::from(surplus && !blocked)
}

/// While the relay is off its load is not part of the measured flow yet, so the export has
/// to cover it
pub fn is_exporting(state: &SurplusState, relay_load: Watt) -> bool {
    let flow = match state.relay {
        PowerState::On => state.net_flow,
        PowerState::Off => state.net_flow + relay_load,
    };

    flow.is_negative()
}
