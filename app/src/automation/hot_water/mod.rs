mod decision;
mod snapshot;

use serde::Deserialize;

use crate::automation::{ActuationIntent, Tick, TickOutcome, intent::pending_power};
use crate::core::{FeedId, Result, time::DailyTimeRange, unit::Watt};
use crate::port::{Actuator, FeedStore};
use crate::t;

pub use decision::RELAY_LOAD;
pub use snapshot::HotWaterSnapshot;

use decision::DecisionParams;

pub const NAME: &str = "hot_water";

#[derive(Debug, Clone, Deserialize)]
pub struct HotWaterConfig {
    pub shelly_url: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub health_check_url: Option<String>,
    #[serde(default = "default_relay_load_watts")]
    pub relay_load_watts: f64,
    #[serde(default = "default_schedule")]
    pub schedule: DailyTimeRange,
    #[serde(default = "default_forced_window")]
    pub forced_window: DailyTimeRange,
    /// Consumption today below which the forced window switches the relay on
    #[serde(default = "default_forced_below")]
    pub forced_below: f64,
    #[serde(default = "default_battery_guard")]
    pub battery_guard: bool,
    pub feeds: HotWaterFeeds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotWaterFeeds {
    pub automation: FeedId,
    pub away: FeedId,
    pub solar_price: FeedId,
    pub grid: FeedId,
    #[serde(default)]
    pub batteries: Vec<FeedId>,
    pub consumption_today: FeedId,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_relay_load_watts() -> f64 {
    RELAY_LOAD.0
}

fn default_schedule() -> DailyTimeRange {
    t!(8:00 - 16:00)
}

fn default_forced_window() -> DailyTimeRange {
    t!(13:00 - 16:00)
}

fn default_forced_below() -> f64 {
    16.0
}

fn default_battery_guard() -> bool {
    true
}

/// Runs the hot-water element on solar surplus within the daily schedule
pub struct HotWaterAutomation<F: FeedStore, A: Actuator> {
    config: HotWaterConfig,
    store: F,
    relay: A,
}

impl<F: FeedStore, A: Actuator> HotWaterAutomation<F, A> {
    pub fn new(config: &HotWaterConfig, store: F, relay: A) -> Self {
        Self {
            config: config.clone(),
            store,
            relay,
        }
    }

    fn params(&self) -> DecisionParams {
        DecisionParams {
            relay_load: Watt(self.config.relay_load_watts),
            battery_guard: self.config.battery_guard,
        }
    }
}

impl<F: FeedStore, A: Actuator> Tick for HotWaterAutomation<F, A> {
    #[tracing::instrument(skip(self), fields(device = self.relay.name()))]
    async fn tick(&self) -> Result<TickOutcome> {
        let snapshot = HotWaterSnapshot::capture(&self.store, &self.relay, &self.config, t!(now)).await?;
        let desired = decision::decide(&snapshot, &self.params());

        let disabled = matches!(snapshot, HotWaterSnapshot::AutomationDisabled);
        if disabled {
            tracing::info!("Hot-water automation disabled, keeping relay on");
        }

        let Some(power) = pending_power(&self.relay, &ActuationIntent::power(desired)).await? else {
            tracing::debug!("Relay already {}", desired);
            return Ok(if disabled {
                TickOutcome::Disabled
            } else {
                TickOutcome::Unchanged
            });
        };

        tracing::info!("Turning {} {} ({:?})", self.relay.name(), power, snapshot);
        self.relay.set_power(power).await?;
        infrastructure::meter::increment("automation_actuation", &[("loop", NAME), ("command", "power")]);

        Ok(TickOutcome::Actuated)
    }
}

#[cfg(test)]
mod tests {
    use crate::automation::testing::{FakeFeedStore, FakeRelay};
    use crate::core::{
        time::{DateTime, FIXED_NOW},
        unit::PowerState,
    };

    use super::*;

    pub fn config() -> HotWaterConfig {
        HotWaterConfig {
            shelly_url: "http://shelly.local".to_string(),
            interval_secs: 60,
            health_check_url: None,
            relay_load_watts: default_relay_load_watts(),
            schedule: default_schedule(),
            forced_window: default_forced_window(),
            forced_below: default_forced_below(),
            battery_guard: true,
            feeds: HotWaterFeeds {
                automation: FeedId(512),
                away: FeedId(513),
                solar_price: FeedId(213),
                grid: FeedId(446),
                batteries: vec![FeedId(350), FeedId(362), FeedId(342)],
                consumption_today: FeedId(233),
            },
        }
    }

    /// Enabled, at home, positive price, idle batteries, no grid flow
    pub fn store() -> FakeFeedStore {
        FakeFeedStore::default()
            .with(512, 1.0)
            .with(513, 0.0)
            .with(213, 0.05)
            .with(446, 0.0)
            .with(350, 0.0)
            .with(362, 0.0)
            .with(342, 0.0)
            .with(233, 20.0)
    }

    async fn tick_at(store: &FakeFeedStore, relay: &FakeRelay, at: DateTime) -> Result<TickOutcome> {
        let automation = HotWaterAutomation::new(&config(), store.clone(), relay.clone());
        FIXED_NOW.scope(at, automation.tick()).await
    }

    #[tokio::test]
    async fn export_example() {
        let store = store().with(446, -500.0);
        let relay = FakeRelay::new(PowerState::Off);

        let outcome = tick_at(&store, &relay, DateTime::local(2025, 1, 15, 10, 0)).await.unwrap();
        assert_eq!(outcome, TickOutcome::Unchanged);
        assert_eq!(relay.power(), PowerState::Off);

        store.set(446, -4000.0);
        let outcome = tick_at(&store, &relay, DateTime::local(2025, 1, 15, 10, 1)).await.unwrap();
        assert_eq!(outcome, TickOutcome::Actuated);
        assert_eq!(relay.calls(), vec![PowerState::On]);
    }

    #[tokio::test]
    async fn turns_off_after_schedule() {
        let store = store().with(446, -4000.0);
        let relay = FakeRelay::new(PowerState::On);

        tick_at(&store, &relay, DateTime::local(2025, 1, 15, 16, 0)).await.unwrap();

        assert_eq!(relay.calls(), vec![PowerState::Off]);
    }

    #[tokio::test]
    async fn disabled_automation_keeps_relay_on() {
        let store = store().with(512, 0.0);
        let relay = FakeRelay::new(PowerState::Off);
        let automation = HotWaterAutomation::new(&config(), store.clone(), relay.clone());

        let first = FIXED_NOW
            .scope(DateTime::local(2025, 1, 15, 22, 0), automation.tick())
            .await
            .unwrap();
        let second = FIXED_NOW
            .scope(DateTime::local(2025, 1, 15, 22, 1), automation.tick())
            .await
            .unwrap();

        assert_eq!(first, TickOutcome::Actuated);
        assert_eq!(second, TickOutcome::Disabled);
        assert_eq!(relay.calls(), vec![PowerState::On]);
        assert_eq!(store.reads(), vec![FeedId(512), FeedId(512)]);
    }

    #[tokio::test]
    async fn read_failure_leaves_relay_alone() {
        let store = store().with(446, -4000.0);
        store.fail_reads_of(342);
        let relay = FakeRelay::new(PowerState::Off);

        let result = tick_at(&store, &relay, DateTime::local(2025, 1, 15, 10, 0)).await;

        assert!(result.is_err());
        assert!(relay.calls().is_empty());
    }

    #[tokio::test]
    async fn forced_window_with_low_consumption() {
        let store = store().with(446, 1500.0).with(233, 3.0);
        let relay = FakeRelay::new(PowerState::Off);

        tick_at(&store, &relay, DateTime::local(2025, 1, 15, 14, 30)).await.unwrap();

        assert_eq!(relay.power(), PowerState::On);
    }
}
