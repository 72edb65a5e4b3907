use crate::automation::{ActuationIntent, Remember};
use crate::core::unit::{ClimateMode, PowerState};

use super::{snapshot::ClimateSnapshot, transition::Transition};

pub const AWAY_ON: &str = "Away mode is active. Turning off AC";
pub const AWAY_OFF: &str = "Away mode disabled. Turning on AC";
pub const SPIKE_ON: &str = "Spike detected. Switching to fan mode";
pub const SPIKE_OFF: &str = "Spike is over. Switching back to original mode";

pub fn decide(snapshot: &ClimateSnapshot, transition: Transition) -> ActuationIntent {
    if snapshot.live.away {
        return while_away(snapshot, transition);
    }

    match transition {
        Transition::AwayChanged => after_away(snapshot),
        Transition::SpikeChanged => on_spike_change(snapshot),
        Transition::None => ActuationIntent::none(),
    }
}

/// Whether the live spike flag may be recorded as known. A spike change that could not be
/// handled yet (away took precedence, or the unit reports no mode) stays pending.
pub fn spike_settled(snapshot: &ClimateSnapshot, transition: Transition) -> bool {
    match snapshot.known.spike {
        Some(known) if known != snapshot.live.spike => {
            transition == Transition::SpikeChanged && !snapshot.live.away && snapshot.mode.is_some()
        }
        _ => true,
    }
}

fn while_away(snapshot: &ClimateSnapshot, transition: Transition) -> ActuationIntent {
    match snapshot.power {
        PowerState::On => ActuationIntent::power(PowerState::Off)
            .remembering(Remember::PreAwayPower(PowerState::On))
            .notifying(AWAY_ON),

        //nothing to restore later, overwrite what a previous away period left behind
        PowerState::Off if transition == Transition::AwayChanged => {
            ActuationIntent::none().remembering(Remember::PreAwayPower(PowerState::Off))
        }

        PowerState::Off => ActuationIntent::none(),
    }
}

fn after_away(snapshot: &ClimateSnapshot) -> ActuationIntent {
    if snapshot.known.pre_away_power == Some(PowerState::On) && snapshot.power != PowerState::On {
        ActuationIntent::power(PowerState::On).notifying(AWAY_OFF)
    } else {
        ActuationIntent::none()
    }
}

fn on_spike_change(snapshot: &ClimateSnapshot) -> ActuationIntent {
    //mode can only be changed while running
    let Some(mode) = snapshot.mode else {
        return ActuationIntent::none();
    };

    match (snapshot.live.spike, mode) {
        (true, ClimateMode::Fan) => ActuationIntent::none(),

        (true, current) => ActuationIntent::mode(ClimateMode::Fan)
            .remembering(Remember::PreSpikeMode(current))
            .notifying(SPIKE_ON),

        (false, ClimateMode::Fan) => match snapshot.known.pre_spike_mode {
            Some(previous) => ActuationIntent::mode(previous).notifying(SPIKE_OFF),
            None => {
                tracing::warn!("Spike is over but no pre-spike mode is known, staying in fan mode");
                ActuationIntent::none()
            }
        },

        (false, _) => ActuationIntent::none(),
    }
}
