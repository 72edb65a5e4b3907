use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        Self::On == self
    }

    pub fn code(self) -> i64 {
        match self {
            PowerState::On => 1,
            PowerState::Off => 0,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PowerState::On),
            0 => Some(PowerState::Off),
            _ => None,
        }
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<&PowerState> for f64 {
    fn from(value: &PowerState) -> Self {
        value.code() as f64
    }
}

impl Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
        }
    }
}
