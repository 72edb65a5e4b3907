use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use chrono::Timelike;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    delegate: chrono::NaiveTime,
}

impl Time {
    pub(super) fn new(delegate: chrono::NaiveTime) -> Self {
        Self { delegate }
    }

    pub fn at(hour: u32, minute: u32) -> anyhow::Result<Self> {
        Ok(Self {
            delegate: chrono::NaiveTime::from_hms_opt(hour, minute, 0)
                .context(format!("Error parsing time {}:{}", hour, minute))?,
        })
    }

    pub fn hour(&self) -> u32 {
        self.delegate.hour()
    }

    pub fn minute(&self) -> u32 {
        self.delegate.minute()
    }
}

impl FromStr for Time {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let delegate = chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .with_context(|| format!("Error parsing time '{}', expected HH:MM", s))?;
        Ok(Self::new(delegate))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.delegate.format("%H:%M"))
    }
}
