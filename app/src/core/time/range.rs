use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use serde::Deserialize;

use super::{DateTime, Time};

/// Window within a day, start inclusive and end exclusive. A window with an end before its
/// start spans midnight.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct DailyTimeRange {
    start: Time,
    end: Time,
}

impl Display for DailyTimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl DailyTimeRange {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: Time) -> bool {
        if self.start <= self.end {
            //same-day scenario
            self.start <= time && time < self.end
        } else {
            //cross-day scenario
            self.start <= time || time < self.end
        }
    }

    pub fn is_active_at(&self, at: DateTime) -> bool {
        self.contains(at.time())
    }
}

impl FromStr for DailyTimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .with_context(|| format!("Error parsing time range '{}', expected HH:MM-HH:MM", s))?;

        Ok(Self::new(start.parse()?, end.parse()?))
    }
}

impl TryFrom<String> for DailyTimeRange {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
