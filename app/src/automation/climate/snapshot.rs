use crate::core::{
    FeedId, MarkerFeed, Result,
    feed::{as_code, as_flag},
    unit::{ClimateMode, PowerState},
};
use crate::port::{ClimateActuator, FeedStore};

use super::ClimateFeeds;

/// Flags published by other systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalFlags {
    pub away: bool,
    pub spike: bool,
}

/// Values the loop wrote itself. `None` until the marker was written the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KnownFlags {
    pub away: Option<bool>,
    pub spike: Option<bool>,
    pub pre_away_power: Option<PowerState>,
    pub pre_spike_mode: Option<ClimateMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClimateSnapshot {
    pub live: ExternalFlags,
    pub known: KnownFlags,
    pub power: PowerState,
    pub mode: Option<ClimateMode>,
}

impl ClimateSnapshot {
    /// Reads everything a tick decides on. The first failing read aborts the capture.
    #[tracing::instrument(skip_all)]
    pub async fn capture(store: &impl FeedStore, actuator: &impl ClimateActuator, feeds: &ClimateFeeds) -> Result<Self> {
        let live = ExternalFlags {
            away: read_flag(store, feeds.away).await?,
            spike: read_flag(store, feeds.price_spike).await?,
        };

        let known = KnownFlags {
            away: read_marker(store, &feeds.known_away).await?.map(as_flag),
            spike: read_marker(store, &feeds.known_spike).await?.map(as_flag),
            pre_away_power: read_marker(store, &feeds.pre_away_power)
                .await?
                .and_then(|v| PowerState::from_code(as_code(v))),
            pre_spike_mode: read_marker(store, &feeds.pre_spike_mode)
                .await?
                .and_then(|v| decode_mode(&feeds.pre_spike_mode, v)),
        };

        let power = actuator.get_power().await?;
        let mode = actuator.get_mode().await?;

        let snapshot = Self {
            live,
            known,
            power,
            mode,
        };
        tracing::debug!("Captured {:?}", snapshot);

        Ok(snapshot)
    }
}

pub async fn read_flag(store: &impl FeedStore, feed: FeedId) -> Result<bool> {
    store.get_required(feed).await.map(as_flag)
}

async fn read_marker(store: &impl FeedStore, marker: &MarkerFeed) -> Result<Option<f64>> {
    store.get(marker.feed).await
}

fn decode_mode(marker: &MarkerFeed, value: f64) -> Option<ClimateMode> {
    let mode = ClimateMode::from_code(as_code(value));
    if mode.is_none() {
        tracing::warn!("Ignoring unknown mode code {} in {}", value, marker.input);
    }
    mode
}
