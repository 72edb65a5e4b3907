//! Loops that publish device and market data into the feed store. The automations read
//! some of these feeds back.

pub mod climate_telemetry;
pub mod price;
pub mod relay_telemetry;
pub mod solaredge;

pub use climate_telemetry::{ClimateTelemetry, ClimateTelemetryConfig};
pub use price::{AmberConfig, PriceBridge};
pub use relay_telemetry::{RelayTelemetry, RelayTelemetryConfig};
pub use solaredge::{SolarEdgeBridge, SolarEdgeConfig};
