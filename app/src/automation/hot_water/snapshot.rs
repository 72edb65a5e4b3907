use crate::core::{
    Result,
    feed::as_flag,
    time::DateTime,
    unit::{PowerState, Watt},
};
use crate::port::{Actuator, FeedStore};

use super::HotWaterConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum HotWaterSnapshot {
    AutomationDisabled,
    OutsideSchedule,
    InSchedule(SurplusState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurplusState {
    pub away: bool,
    pub solar_price: f64,
    /// Grid plus battery flow, negative while energy leaves the house
    pub net_flow: Watt,
    /// Positive while the batteries discharge
    pub battery_flow: Watt,
    pub relay: PowerState,
    pub forced: bool,
}

impl HotWaterSnapshot {
    /// Reads only what the current time of day and the automation switch make relevant
    #[tracing::instrument(skip_all, fields(%now))]
    pub async fn capture(
        store: &impl FeedStore,
        relay: &impl Actuator,
        config: &HotWaterConfig,
        now: DateTime,
    ) -> Result<Self> {
        let feeds = &config.feeds;

        if !as_flag(store.get_required(feeds.automation).await?) {
            return Ok(Self::AutomationDisabled);
        }

        if !config.schedule.is_active_at(now) {
            return Ok(Self::OutsideSchedule);
        }

        let away = as_flag(store.get_required(feeds.away).await?);
        let solar_price = store.get_required(feeds.solar_price).await?;
        let grid = Watt(store.get_required(feeds.grid).await?);

        let mut battery_sum = Watt(0.0);
        for feed in &feeds.batteries {
            battery_sum = battery_sum + Watt(store.get_required(*feed).await?);
        }
        let battery_flow = -battery_sum;

        let relay = relay.get_power().await?;

        let forced = if config.forced_window.is_active_at(now) {
            let today = store.get_required(feeds.consumption_today).await?;
            tracing::debug!("Consumption today {} within forced window {}", today, config.forced_window);
            today < config.forced_below
        } else {
            false
        };

        let state = SurplusState {
            away,
            solar_price,
            net_flow: grid + battery_flow,
            battery_flow,
            relay,
            forced,
        };
        tracing::debug!("Captured {:?}", state);

        Ok(Self::InSchedule(state))
    }
}
