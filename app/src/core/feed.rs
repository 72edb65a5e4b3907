use std::fmt::Display;

use serde::Deserialize;

/// Numeric identifier of a feed in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct FeedId(pub u32);

impl Display for FeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feed#{}", self.0)
    }
}

/// A value written by the automation itself. It is read back through its feed and written
/// through the input of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkerFeed {
    pub feed: FeedId,
    pub input: String,
}

impl MarkerFeed {
    pub fn new(feed: u32, input: &str) -> Self {
        Self {
            feed: FeedId(feed),
            input: input.to_string(),
        }
    }
}

/// Flags and enum codes are published as floats. They are compared as integers.
pub fn as_code(value: f64) -> i64 {
    value.round() as i64
}

pub fn as_flag(value: f64) -> bool {
    as_code(value) != 0
}
