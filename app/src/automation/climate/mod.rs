mod decision;
mod snapshot;
mod transition;

use serde::Deserialize;

use crate::automation::{ActuationIntent, Remember, SideEffects, Tick, TickOutcome, intent::pending_power};
use crate::core::{FeedId, MarkerFeed, Result};
use crate::port::{ClimateActuator, FeedStore};

pub use snapshot::ClimateSnapshot;
pub use transition::Transition;

pub const NAME: &str = "climate";

#[derive(Debug, Clone, Deserialize)]
pub struct ClimateConfig {
    pub entity_id: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub health_check_url: Option<String>,
    #[serde(default = "default_node")]
    pub node: String,
    pub feeds: ClimateFeeds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClimateFeeds {
    pub automation: FeedId,
    pub away: FeedId,
    pub price_spike: FeedId,
    pub known_spike: MarkerFeed,
    pub known_away: MarkerFeed,
    pub pre_spike_mode: MarkerFeed,
    pub pre_away_power: MarkerFeed,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_node() -> String {
    "AUTOMATION".to_string()
}

impl ClimateFeeds {
    pub fn markers(&self) -> [&MarkerFeed; 4] {
        [&self.known_spike, &self.known_away, &self.pre_spike_mode, &self.pre_away_power]
    }
}

/// Keeps the air-conditioner in line with the away flag and price spikes
pub struct ClimateAutomation<F: FeedStore, A: ClimateActuator> {
    node: String,
    feeds: ClimateFeeds,
    store: F,
    actuator: A,
    side_effects: SideEffects,
}

impl<F: FeedStore, A: ClimateActuator> ClimateAutomation<F, A> {
    pub fn new(config: &ClimateConfig, store: F, actuator: A, side_effects: SideEffects) -> Self {
        Self {
            node: config.node.clone(),
            feeds: config.feeds.clone(),
            store,
            actuator,
            side_effects,
        }
    }

    /// Brings the device to the intended state. Returns whether a device call was made.
    async fn apply(&self, intent: ActuationIntent) -> Result<bool> {
        let power = pending_power(&self.actuator, &intent).await?;
        let mode = match intent.mode {
            Some(mode) if self.actuator.get_mode().await? != Some(mode) => Some(mode),
            _ => None,
        };
        let pending = power.is_some() || mode.is_some();

        if let Some(remember) = intent.remember.filter(|_| pending || intent.is_noop()) {
            self.remember(remember).await?;
        }

        if let Some(power) = power {
            tracing::info!("Switching {} {}", self.actuator.name(), power);
            self.actuator.set_power(power).await?;
            infrastructure::meter::increment("automation_actuation", &[("loop", NAME), ("command", "power")]);
        }

        if let Some(mode) = mode {
            tracing::info!("Switching {} to mode {}", self.actuator.name(), mode);
            self.actuator.set_mode(mode).await?;
            infrastructure::meter::increment("automation_actuation", &[("loop", NAME), ("command", "mode")]);
        }

        if let Some(message) = intent.notification.filter(|_| pending) {
            self.side_effects.notify(message);
        }

        Ok(pending)
    }

    async fn remember(&self, remember: Remember) -> Result<()> {
        let (marker, code) = match remember {
            Remember::PreAwayPower(power) => (&self.feeds.pre_away_power, power.code()),
            Remember::PreSpikeMode(mode) => (&self.feeds.pre_spike_mode, mode.code()),
        };

        tracing::debug!("Remembering {:?} in {}", remember, marker.input);
        self.store.post(&self.node, &[(marker.input.as_str(), code as f64)]).await
    }

    /// Re-asserts the flags this tick acted on, so the same change is not seen again. An
    /// unsettled spike change keeps its old marker and is picked up by a later tick.
    async fn persist_known(&self, snapshot: &ClimateSnapshot, spike_settled: bool) -> Result<()> {
        let mut values = vec![];
        if spike_settled {
            values.push((self.feeds.known_spike.input.as_str(), flag_value(snapshot.live.spike)));
        } else {
            tracing::debug!("Spike change not handled yet, keeping {}", self.feeds.known_spike.input);
        }
        values.push((self.feeds.known_away.input.as_str(), flag_value(snapshot.live.away)));

        self.store.post(&self.node, &values).await
    }
}

impl<F: FeedStore, A: ClimateActuator> Tick for ClimateAutomation<F, A> {
    #[tracing::instrument(skip(self), fields(device = self.actuator.name()))]
    async fn tick(&self) -> Result<TickOutcome> {
        if !snapshot::read_flag(&self.store, self.feeds.automation).await? {
            tracing::info!("Climate automation disabled");
            return Ok(TickOutcome::Disabled);
        }

        let snapshot = ClimateSnapshot::capture(&self.store, &self.actuator, &self.feeds).await?;
        let transition = transition::detect(&snapshot.live, &snapshot.known);
        let intent = decision::decide(&snapshot, transition);
        let spike_settled = decision::spike_settled(&snapshot, transition);

        if transition != Transition::None && !intent.is_noop() {
            tracing::info!("Detected {:?}, intent {:?}", transition, intent);
        } else if transition != Transition::None {
            tracing::debug!("Detected {:?}, nothing to do", transition);
        }

        let actuated = self.apply(intent).await?;
        self.persist_known(&snapshot, spike_settled).await?;

        Ok(if actuated {
            TickOutcome::Actuated
        } else {
            TickOutcome::Unchanged
        })
    }
}

fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::Receiver;

    use crate::automation::{
        SideEffect,
        testing::{FakeClimate, FakeFeedStore, notifications},
    };
    use crate::core::{
        Error,
        unit::{ClimateMode, PowerState},
    };

    use super::decision::{AWAY_OFF, AWAY_ON, SPIKE_OFF, SPIKE_ON};
    use super::*;

    const AUTOMATION: u32 = 511;
    const AWAY: u32 = 513;
    const SPIKE: u32 = 217;
    const KNOWN_SPIKE: u32 = 509;
    const KNOWN_AWAY: u32 = 510;
    const PRE_SPIKE: u32 = 514;
    const PRE_AWAY: u32 = 515;

    pub fn feeds() -> ClimateFeeds {
        ClimateFeeds {
            automation: FeedId(AUTOMATION),
            away: FeedId(AWAY),
            price_spike: FeedId(SPIKE),
            known_spike: MarkerFeed::new(KNOWN_SPIKE, "ac-mode-known-spike"),
            known_away: MarkerFeed::new(KNOWN_AWAY, "ac-power-known-away"),
            pre_spike_mode: MarkerFeed::new(PRE_SPIKE, "ac-mode-pre-spike"),
            pre_away_power: MarkerFeed::new(PRE_AWAY, "ac-power-pre-away"),
        }
    }

    fn config() -> ClimateConfig {
        ClimateConfig {
            entity_id: "climate.test".to_string(),
            interval_secs: 5,
            health_check_url: None,
            node: "AUTOMATION".to_string(),
            feeds: feeds(),
        }
    }

    /// Store with every marker linked to its feed and automation enabled
    fn store() -> FakeFeedStore {
        FakeFeedStore::default()
            .linked("ac-mode-known-spike", KNOWN_SPIKE)
            .linked("ac-power-known-away", KNOWN_AWAY)
            .linked("ac-mode-pre-spike", PRE_SPIKE)
            .linked("ac-power-pre-away", PRE_AWAY)
            .with(AUTOMATION, 1.0)
    }

    fn automation(
        store: &FakeFeedStore,
        ac: &FakeClimate,
    ) -> (ClimateAutomation<FakeFeedStore, FakeClimate>, Receiver<SideEffect>) {
        let (side_effects, rx) = SideEffects::channel(NAME, 16);
        (ClimateAutomation::new(&config(), store.clone(), ac.clone(), side_effects), rx)
    }

    #[tokio::test]
    async fn cold_start_adopts_live_state() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 1.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        let outcome = automation.tick().await.unwrap();

        assert_eq!(outcome, TickOutcome::Unchanged);
        assert!(ac.calls().is_empty());
        assert!(notifications(&mut rx).is_empty());
        assert_eq!(store.value(KNOWN_SPIKE), Some(1.0));
        assert_eq!(store.value(KNOWN_AWAY), Some(0.0));
    }

    #[tokio::test]
    async fn spike_round_trip() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        store.set(SPIKE, 1.0);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);

        assert_eq!(ac.current_mode(), ClimateMode::Fan);
        assert_eq!(store.value(PRE_SPIKE), Some(ClimateMode::Cool.code() as f64));
        assert_eq!(store.value(KNOWN_SPIKE), Some(1.0));
        assert_eq!(notifications(&mut rx), vec![SPIKE_ON]);

        store.set(SPIKE, 0.0);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);

        assert_eq!(ac.current_mode(), ClimateMode::Cool);
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));
        assert_eq!(notifications(&mut rx), vec![SPIKE_OFF]);
        assert_eq!(ac.calls(), vec!["mode:Fan", "mode:Cool"]);
    }

    #[tokio::test]
    async fn acts_once_per_edge() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 1.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        automation.tick().await.unwrap();
        let second = automation.tick().await.unwrap();
        let third = automation.tick().await.unwrap();

        assert_eq!(second, TickOutcome::Unchanged);
        assert_eq!(third, TickOutcome::Unchanged);
        assert_eq!(ac.calls(), vec!["mode:Fan"]);
        assert_eq!(notifications(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn away_wins_over_simultaneous_spike() {
        let store = store().with(AWAY, 1.0).with(SPIKE, 1.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        automation.tick().await.unwrap();

        assert_eq!(ac.calls(), vec!["power:off"]);
        assert_eq!(store.value(PRE_AWAY), Some(1.0));
        assert_eq!(notifications(&mut rx), vec![AWAY_ON]);
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));
        assert_eq!(store.value(KNOWN_AWAY), Some(1.0));
    }

    #[tokio::test]
    async fn spike_end_while_off_restores_mode_once_running() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        store.set(SPIKE, 1.0);
        automation.tick().await.unwrap();
        assert_eq!(ac.current_mode(), ClimateMode::Fan);

        ac.switch(PowerState::Off);
        store.set(SPIKE, 0.0);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Unchanged);
        assert_eq!(store.value(KNOWN_SPIKE), Some(1.0));

        ac.switch(PowerState::On);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);

        assert_eq!(ac.current_mode(), ClimateMode::Cool);
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));
        assert_eq!(ac.calls(), vec!["mode:Fan", "mode:Cool"]);
        assert_eq!(notifications(&mut rx), vec![SPIKE_ON, SPIKE_OFF]);
    }

    #[tokio::test]
    async fn spike_start_while_off_switches_to_fan_once_running() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::Off, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        store.set(SPIKE, 1.0);
        automation.tick().await.unwrap();
        automation.tick().await.unwrap();
        assert!(ac.calls().is_empty());
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));

        ac.switch(PowerState::On);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);
        automation.tick().await.unwrap();

        assert_eq!(ac.current_mode(), ClimateMode::Fan);
        assert_eq!(store.value(PRE_SPIKE), Some(ClimateMode::Cool.code() as f64));
        assert_eq!(store.value(KNOWN_SPIKE), Some(1.0));
        assert_eq!(ac.calls(), vec!["mode:Fan"]);
        assert_eq!(notifications(&mut rx), vec![SPIKE_ON]);
    }

    #[tokio::test]
    async fn spike_during_away_exit_is_handled_next_tick() {
        let store = store()
            .with(AWAY, 1.0)
            .with(SPIKE, 0.0)
            .with(KNOWN_SPIKE, 0.0)
            .with(KNOWN_AWAY, 1.0)
            .with(PRE_AWAY, 1.0);
        let ac = FakeClimate::new(PowerState::Off, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        store.set(AWAY, 0.0);
        store.set(SPIKE, 1.0);
        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);

        assert_eq!(ac.power(), PowerState::On);
        assert_eq!(store.value(KNOWN_AWAY), Some(0.0));
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));

        assert_eq!(automation.tick().await.unwrap(), TickOutcome::Actuated);

        assert_eq!(ac.current_mode(), ClimateMode::Fan);
        assert_eq!(store.value(KNOWN_SPIKE), Some(1.0));
        assert_eq!(ac.calls(), vec!["power:on", "mode:Fan"]);
        assert_eq!(notifications(&mut rx), vec![AWAY_OFF, SPIKE_ON]);
    }

    #[tokio::test]
    async fn away_period_restores_power_once() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        store.set(AWAY, 1.0);
        automation.tick().await.unwrap();
        automation.tick().await.unwrap();
        assert_eq!(ac.power(), PowerState::Off);

        store.set(AWAY, 0.0);
        automation.tick().await.unwrap();
        automation.tick().await.unwrap();
        automation.tick().await.unwrap();

        assert_eq!(ac.power(), PowerState::On);
        assert_eq!(ac.calls(), vec!["power:off", "power:on"]);
        assert_eq!(notifications(&mut rx), vec![AWAY_ON, AWAY_OFF]);
    }

    #[tokio::test]
    async fn unit_off_during_away_stays_off_afterwards() {
        let store = store()
            .with(AWAY, 0.0)
            .with(SPIKE, 0.0)
            .with(KNOWN_SPIKE, 0.0)
            .with(KNOWN_AWAY, 0.0)
            .with(PRE_AWAY, 1.0);
        let ac = FakeClimate::new(PowerState::Off, ClimateMode::Cool);
        let (automation, _rx) = automation(&store, &ac);

        store.set(AWAY, 1.0);
        automation.tick().await.unwrap();
        assert_eq!(store.value(PRE_AWAY), Some(0.0));

        store.set(AWAY, 0.0);
        automation.tick().await.unwrap();

        assert!(ac.calls().is_empty());
    }

    #[tokio::test]
    async fn read_failure_aborts_without_side_effects() {
        let store = store().with(AWAY, 1.0).with(SPIKE, 1.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        store.fail_reads_of(KNOWN_AWAY);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, mut rx) = automation(&store, &ac);

        let result = automation.tick().await;

        assert!(matches!(result, Err(Error::Unavailable { .. })));
        assert!(ac.calls().is_empty());
        assert!(store.posts().is_empty());
        assert!(notifications(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn device_failure_aborts_before_markers() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 1.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        ac.go_offline();
        let (automation, _rx) = automation(&store, &ac);

        let result = automation.tick().await;

        assert!(matches!(result, Err(Error::Device { .. })));
        assert_eq!(store.value(KNOWN_SPIKE), Some(0.0));
        assert!(store.posts().is_empty());
    }

    #[tokio::test]
    async fn failed_marker_write_fails_the_tick() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        store.fail_posts();
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, _rx) = automation(&store, &ac);

        let result = automation.tick().await;

        assert!(matches!(result, Err(Error::Unavailable { .. })));
    }

    #[tokio::test]
    async fn disabled_automation_reads_nothing_else() {
        let store = store().with(AWAY, 1.0).with(SPIKE, 1.0).with(KNOWN_SPIKE, 0.0).with(KNOWN_AWAY, 0.0);
        store.set(AUTOMATION, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, _rx) = automation(&store, &ac);

        let outcome = automation.tick().await.unwrap();

        assert_eq!(outcome, TickOutcome::Disabled);
        assert_eq!(store.reads(), vec![FeedId(AUTOMATION)]);
        assert!(store.posts().is_empty());
        assert!(ac.calls().is_empty());
    }

    #[tokio::test]
    async fn matching_device_state_skips_call_and_notification() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0).with(KNOWN_SPIKE, 1.0).with(KNOWN_AWAY, 0.0);
        store.set(PRE_SPIKE, ClimateMode::Fan.code() as f64);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Fan);
        let (automation, mut rx) = automation(&store, &ac);

        let outcome = automation.tick().await.unwrap();

        assert_eq!(outcome, TickOutcome::Unchanged);
        assert!(ac.calls().is_empty());
        assert!(notifications(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn markers_are_posted_in_one_request() {
        let store = store().with(AWAY, 0.0).with(SPIKE, 0.0);
        let ac = FakeClimate::new(PowerState::On, ClimateMode::Cool);
        let (automation, _rx) = automation(&store, &ac);

        automation.tick().await.unwrap();

        assert_eq!(
            store.posts(),
            vec![(
                "AUTOMATION".to_string(),
                vec![
                    ("ac-mode-known-spike".to_string(), 0.0),
                    ("ac-power-known-away".to_string(), 0.0)
                ]
            )]
        );
    }
}
