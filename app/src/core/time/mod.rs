pub mod builder;
mod datetime;
mod range;
mod time;

pub use datetime::DateTime;
pub use range::DailyTimeRange;
pub use time::Time;

#[cfg(test)]
pub use datetime::FIXED_NOW;
