mod http;
mod monitoring;

pub use http::HttpClientConfig;
pub use monitoring::{EnvFilterConfig, MonitoringConfig, OtlpConfig};

pub mod meter {
    pub use super::monitoring::meter::{increment, set};
}
