mod error;
pub mod feed;
pub mod time;
pub mod unit;

pub use error::{Error, Result};
pub use feed::{FeedId, MarkerFeed};
