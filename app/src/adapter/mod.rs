pub mod amber;
pub mod emoncms;
pub mod healthchecks;
pub mod homeassistant;
pub mod pushover;
pub mod shelly;
pub mod solaredge;
