use derive_more::derive::{Display, Error};

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy of the automation loops. `Unavailable` and `Device` abort a single
/// tick, `Config` is only raised at startup.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum Error {
    #[display("{target} unavailable: {reason}")]
    Unavailable { target: String, reason: String },

    #[display("device {device} failed: {reason}")]
    Device { device: String, reason: String },

    #[display("invalid configuration: {reason}")]
    Config { reason: String },
}

impl Error {
    pub fn unavailable(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn device(device: impl Into<String>, reason: impl ToString) -> Self {
        Self::Device {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(reason: impl ToString) -> Self {
        Self::Config {
            reason: reason.to_string(),
        }
    }

    /// Short label for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unavailable { .. } => "unavailable",
            Error::Device { .. } => "device",
            Error::Config { .. } => "config",
        }
    }
}
