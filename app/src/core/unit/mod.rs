mod climate_mode;
mod power_state;
mod watt;

pub use climate_mode::ClimateMode;
pub use power_state::PowerState;
pub use watt::Watt;
