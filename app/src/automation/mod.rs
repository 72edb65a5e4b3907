pub mod climate;
pub mod hot_water;
mod intent;
mod scheduler;
mod side_effect;

#[cfg(test)]
pub mod testing;

pub use intent::{ActuationIntent, Remember, TickOutcome};
pub use scheduler::{Scheduler, Tick};
pub use side_effect::{SideEffect, SideEffectRunner, SideEffects};
