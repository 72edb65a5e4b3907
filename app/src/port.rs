#![allow(async_fn_in_trait)]

use crate::core::{
    Error, FeedId, Result,
    unit::{ClimateMode, PowerState},
};

pub trait FeedStore {
    /// Latest value of a feed, `None` if the feed exists but never received a value
    async fn get(&self, feed: FeedId) -> Result<Option<f64>>;

    /// Publishes named values as inputs of the given node
    async fn post(&self, node: &str, values: &[(&str, f64)]) -> Result<()>;

    async fn get_required(&self, feed: FeedId) -> Result<f64> {
        self.get(feed)
            .await?
            .ok_or_else(|| Error::unavailable(feed.to_string(), "feed has no value"))
    }
}

/// A switchable device
pub trait Actuator {
    fn name(&self) -> &str;

    async fn get_power(&self) -> Result<PowerState>;

    async fn set_power(&self, power: PowerState) -> Result<()>;
}

pub trait ClimateActuator: Actuator {
    /// Current operating mode, `None` while the device does not report one (powered off)
    async fn get_mode(&self) -> Result<Option<ClimateMode>>;

    async fn set_mode(&self, mode: ClimateMode) -> Result<()>;
}

pub trait Notifier {
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum HealthStatus {
    #[display("success")]
    Success,
    #[display("fail")]
    Fail,
}

pub trait HealthSink {
    async fn ping(&self, status: HealthStatus) -> anyhow::Result<()>;
}
