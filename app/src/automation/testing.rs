use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc::Receiver;

use crate::core::{
    Error, FeedId, Result,
    unit::{ClimateMode, PowerState},
};
use crate::port::{Actuator, ClimateActuator, FeedStore};

use super::SideEffect;

/// In-memory feed store. Posted inputs linked to a feed update that feed, the way the
/// remote store logs inputs to feeds.
#[derive(Clone, Default)]
pub struct FakeFeedStore {
    state: Arc<Mutex<FeedStoreState>>,
}

#[derive(Default)]
struct FeedStoreState {
    values: HashMap<FeedId, f64>,
    failing: HashSet<FeedId>,
    links: HashMap<String, FeedId>,
    reads: Vec<FeedId>,
    posts: Vec<(String, Vec<(String, f64)>)>,
    fail_posts: bool,
}

impl FakeFeedStore {
    pub fn with(self, feed: u32, value: f64) -> Self {
        self.set(feed, value);
        self
    }

    pub fn linked(self, input: &str, feed: u32) -> Self {
        self.state.lock().unwrap().links.insert(input.to_string(), FeedId(feed));
        self
    }

    pub fn set(&self, feed: u32, value: f64) {
        self.state.lock().unwrap().values.insert(FeedId(feed), value);
    }

    pub fn value(&self, feed: u32) -> Option<f64> {
        self.state.lock().unwrap().values.get(&FeedId(feed)).copied()
    }

    pub fn fail_reads_of(&self, feed: u32) {
        self.state.lock().unwrap().failing.insert(FeedId(feed));
    }

    pub fn fail_posts(&self) {
        self.state.lock().unwrap().fail_posts = true;
    }

    pub fn reads(&self) -> Vec<FeedId> {
        self.state.lock().unwrap().reads.clone()
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, f64)>)> {
        self.state.lock().unwrap().posts.clone()
    }
}

impl FeedStore for FakeFeedStore {
    async fn get(&self, feed: FeedId) -> Result<Option<f64>> {
        let mut state = self.state.lock().unwrap();
        state.reads.push(feed);

        if state.failing.contains(&feed) {
            return Err(Error::unavailable("emoncms", format!("{} read failed", feed)));
        }

        Ok(state.values.get(&feed).copied())
    }

    async fn post(&self, node: &str, values: &[(&str, f64)]) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if state.fail_posts {
            return Err(Error::unavailable("emoncms", "post failed"));
        }

        for (input, value) in values {
            if let Some(feed) = state.links.get(*input).copied() {
                state.values.insert(feed, *value);
            }
        }

        let values = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        state.posts.push((node.to_string(), values));
        Ok(())
    }
}

/// Air conditioner that keeps its mode while powered off but only reports it while on
#[derive(Clone)]
pub struct FakeClimate {
    state: Arc<Mutex<FakeClimateState>>,
}

struct FakeClimateState {
    power: PowerState,
    mode: ClimateMode,
    calls: Vec<String>,
    offline: bool,
}

impl FakeClimate {
    pub fn new(power: PowerState, mode: ClimateMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeClimateState {
                power,
                mode,
                calls: vec![],
                offline: false,
            })),
        }
    }

    pub fn power(&self) -> PowerState {
        self.state.lock().unwrap().power
    }

    pub fn current_mode(&self) -> ClimateMode {
        self.state.lock().unwrap().mode
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Someone flips the unit with the remote
    pub fn switch(&self, power: PowerState) {
        self.state.lock().unwrap().power = power;
    }

    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    fn check_online(&self, state: &FakeClimateState) -> Result<()> {
        if state.offline {
            return Err(Error::device(self.name(), "unavailable"));
        }
        Ok(())
    }
}

impl Actuator for FakeClimate {
    fn name(&self) -> &str {
        "climate.test"
    }

    async fn get_power(&self) -> Result<PowerState> {
        let state = self.state.lock().unwrap();
        self.check_online(&state)?;
        Ok(state.power)
    }

    async fn set_power(&self, power: PowerState) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.check_online(&state)?;
        state.calls.push(format!("power:{}", power));
        state.power = power;
        Ok(())
    }
}

impl ClimateActuator for FakeClimate {
    async fn get_mode(&self) -> Result<Option<ClimateMode>> {
        let state = self.state.lock().unwrap();
        self.check_online(&state)?;
        Ok(state.power.is_on().then_some(state.mode))
    }

    async fn set_mode(&self, mode: ClimateMode) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.check_online(&state)?;
        state.calls.push(format!("mode:{}", mode));
        state.mode = mode;
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeRelay {
    state: Arc<Mutex<(PowerState, Vec<PowerState>)>>,
}

impl FakeRelay {
    pub fn new(power: PowerState) -> Self {
        Self {
            state: Arc::new(Mutex::new((power, vec![]))),
        }
    }

    pub fn power(&self) -> PowerState {
        self.state.lock().unwrap().0
    }

    pub fn calls(&self) -> Vec<PowerState> {
        self.state.lock().unwrap().1.clone()
    }
}

impl Actuator for FakeRelay {
    fn name(&self) -> &str {
        "relay.test"
    }

    async fn get_power(&self) -> Result<PowerState> {
        Ok(self.state.lock().unwrap().0)
    }

    async fn set_power(&self, power: PowerState) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.0 = power;
        state.1.push(power);
        Ok(())
    }
}

pub fn notifications(rx: &mut Receiver<SideEffect>) -> Vec<String> {
    let mut messages = vec![];
    while let Ok(effect) = rx.try_recv() {
        if let SideEffect::Notify(message) = effect {
            messages.push(message);
        }
    }
    messages
}
