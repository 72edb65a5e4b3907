#![allow(async_fn_in_trait)]

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::core::Result;
use crate::port::HealthStatus;

use super::{SideEffects, TickOutcome};

/// One read-decide-act cycle of an automation loop
pub trait Tick {
    async fn tick(&self) -> Result<TickOutcome>;
}

pub struct Scheduler {
    name: &'static str,
    interval: Duration,
    side_effects: SideEffects,
}

impl Scheduler {
    pub fn new(name: &'static str, interval: Duration, side_effects: SideEffects) -> Self {
        Self {
            name,
            interval,
            side_effects,
        }
    }

    /// Runs the job forever. The first tick starts immediately, ticks never overlap and
    /// fires that elapse while a tick is running are dropped.
    pub async fn run(self, job: impl Tick) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(automation = self.name, "Starting automation loop every {:?}", self.interval);

        loop {
            timer.tick().await;

            let started = Instant::now();
            let outcome = job.tick().await;
            let elapsed = started.elapsed();

            self.report(outcome);

            let missed = missed_fires(elapsed, self.interval);
            if missed > 0 {
                tracing::warn!(
                    automation = self.name,
                    "Tick took {:?}, skipping {} scheduled run(s)",
                    elapsed,
                    missed
                );
                timer.reset();
            }
        }
    }

    fn report(&self, outcome: Result<TickOutcome>) {
        match outcome {
            Ok(outcome) => {
                tracing::debug!(automation = self.name, "Tick finished: {:?}", outcome);
                infrastructure::meter::increment(
                    "automation_tick",
                    &[("loop", self.name), ("outcome", outcome.as_label())],
                );
                self.side_effects.report_health(HealthStatus::Success);
            }

            Err(e) => {
                tracing::error!(automation = self.name, "Tick aborted: {}", e);
                infrastructure::meter::increment("automation_tick", &[("loop", self.name), ("outcome", e.kind())]);
                self.side_effects.report_health(HealthStatus::Fail);
            }
        }
    }
}

/// Number of timer fires that fell into a tick of the given duration
fn missed_fires(elapsed: Duration, interval: Duration) -> u128 {
    if interval.is_zero() {
        return 0;
    }

    elapsed.as_nanos() / interval.as_nanos()
}
