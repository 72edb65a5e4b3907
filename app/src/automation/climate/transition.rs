use super::snapshot::{ExternalFlags, KnownFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    AwayChanged,
    SpikeChanged,
}

/// Compares live flags against the values acted on last time. Away changes win over spike
/// changes. A marker that was never written counts as unchanged.
pub fn detect(live: &ExternalFlags, known: &KnownFlags) -> Transition {
    if known.away.is_some_and(|away| away != live.away) {
        Transition::AwayChanged
    } else if known.spike.is_some_and(|spike| spike != live.spike) {
        Transition::SpikeChanged
    } else {
        Transition::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(away: bool, spike: bool) -> ExternalFlags {
        ExternalFlags { away, spike }
    }

    fn known(away: Option<bool>, spike: Option<bool>) -> KnownFlags {
        KnownFlags {
            away,
            spike,
            ..KnownFlags::default()
        }
    }

    #[test]
    fn unchanged() {
        assert_eq!(detect(&live(false, true), &known(Some(false), Some(true))), Transition::None);
    }

    #[test]
    fn spike_changed() {
        assert_eq!(
            detect(&live(false, true), &known(Some(false), Some(false))),
            Transition::SpikeChanged
        );
    }

    #[test]
    fn away_wins_over_spike() {
        assert_eq!(
            detect(&live(true, true), &known(Some(false), Some(false))),
            Transition::AwayChanged
        );
    }

    #[test]
    fn cold_start_is_no_transition() {
        assert_eq!(detect(&live(true, true), &known(None, None)), Transition::None);
        assert_eq!(detect(&live(true, true), &known(None, Some(false))), Transition::SpikeChanged);
    }
}
