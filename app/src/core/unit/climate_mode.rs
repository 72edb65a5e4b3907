use std::fmt::Display;

/// Operating mode of the air-conditioner, stored in the feed store by numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateMode {
    Cool,
    Fan,
    Dry,
    Heat,
    AutoCool,
    AutoHeat,
}

impl ClimateMode {
    pub const ALL: [ClimateMode; 6] = [
        ClimateMode::Cool,
        ClimateMode::Fan,
        ClimateMode::Dry,
        ClimateMode::Heat,
        ClimateMode::AutoCool,
        ClimateMode::AutoHeat,
    ];

    pub fn code(self) -> i64 {
        match self {
            ClimateMode::Cool => 2,
            ClimateMode::Fan => 0,
            ClimateMode::Dry => 7,
            ClimateMode::Heat => 1,
            ClimateMode::AutoCool => 22,
            ClimateMode::AutoHeat => 11,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }
}

impl Display for ClimateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClimateMode::Cool => "Cool",
            ClimateMode::Fan => "Fan",
            ClimateMode::Dry => "Dry",
            ClimateMode::Heat => "Heat",
            ClimateMode::AutoCool => "AutoCool",
            ClimateMode::AutoHeat => "AutoHeat",
        };
        write!(f, "{}", name)
    }
}
