use std::{future::Future, time::Duration};

use adapter::{healthchecks::HealthcheckPing, pushover::PushoverNotifier, shelly::ShellyRelay, solaredge::SunSpecClient};
use anyhow::Context;
use automation::{
    Scheduler, SideEffectRunner, SideEffects, Tick,
    climate::{self, ClimateAutomation},
    hot_water::{self, HotWaterAutomation},
};
use bridge::{ClimateTelemetry, PriceBridge, RelayTelemetry, SolarEdgeBridge};
use settings::Settings;

mod adapter;
mod automation;
mod bridge;
mod core;
pub mod port;
mod settings;

const SIDE_EFFECT_CAPACITY: usize = 16;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");
    settings.validate().expect("Invalid configuration");

    let climate_exec = new_climate_loop(&settings).expect("Error initializing climate automation");
    let hot_water_exec = new_hot_water_loop(&settings).expect("Error initializing hot-water automation");
    let relay_telemetry_exec = new_relay_telemetry_loop(&settings).expect("Error initializing relay telemetry");
    let price_exec = new_price_loop(&settings).expect("Error initializing price bridge");
    let climate_telemetry_exec = new_climate_telemetry_loop(&settings).expect("Error initializing climate telemetry");
    let solaredge_exec = new_solaredge_loop(&settings).expect("Error initializing SolarEdge bridge");

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = run_if_configured(climate_exec) => {},
        _ = run_if_configured(hot_water_exec) => {},
        _ = run_if_configured(relay_telemetry_exec) => {},
        _ = run_if_configured(price_exec) => {},
        _ = run_if_configured(climate_telemetry_exec) => {},
        _ = run_if_configured(solaredge_exec) => {},
    );
}

fn new_climate_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.climate else {
        return Ok(None);
    };

    let homeassistant = settings
        .homeassistant
        .as_ref()
        .context("Climate automation requires Home Assistant")?;

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let actuator = homeassistant.new_climate(&config.entity_id, settings.http_timeout_secs)?;
    let notifier = settings
        .pushover
        .as_ref()
        .map(|p| p.new_notifier("Climate automation", settings.http_timeout_secs))
        .transpose()?;
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let (side_effects, rx) = SideEffects::channel(climate::NAME, SIDE_EFFECT_CAPACITY);
    let job = ClimateAutomation::new(config, store, actuator, side_effects.clone());

    Ok(Some(supervised(
        climate::NAME,
        config.interval_secs,
        job,
        side_effects,
        SideEffectRunner::new(climate::NAME, rx, notifier, health),
    )))
}

fn new_hot_water_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.hot_water else {
        return Ok(None);
    };

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let relay = ShellyRelay::new(&config.shelly_url, settings.http_timeout_secs)?;
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let (side_effects, rx) = SideEffects::channel(hot_water::NAME, SIDE_EFFECT_CAPACITY);
    let job = HotWaterAutomation::new(config, store, relay);

    Ok(Some(supervised(
        hot_water::NAME,
        config.interval_secs,
        job,
        side_effects,
        SideEffectRunner::new(hot_water::NAME, rx, None::<PushoverNotifier>, health),
    )))
}

fn new_relay_telemetry_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.relay_telemetry else {
        return Ok(None);
    };

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let relay = ShellyRelay::new(&config.shelly_url, settings.http_timeout_secs)?;
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let name = bridge::relay_telemetry::NAME;
    let (side_effects, rx) = SideEffects::channel(name, SIDE_EFFECT_CAPACITY);

    Ok(Some(supervised(
        name,
        config.interval_secs,
        RelayTelemetry::new(relay, store),
        side_effects,
        SideEffectRunner::new(name, rx, None::<PushoverNotifier>, health),
    )))
}

fn new_price_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.amber else {
        return Ok(None);
    };

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let client = adapter::amber::AmberClient::new(
        &config.url,
        &config.site_id,
        &config.api_key,
        settings.http_timeout_secs,
    )?;
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let name = bridge::price::NAME;
    let (side_effects, rx) = SideEffects::channel(name, SIDE_EFFECT_CAPACITY);

    Ok(Some(supervised(
        name,
        config.interval_secs,
        PriceBridge::new(client, store, &config.node),
        side_effects,
        SideEffectRunner::new(name, rx, None::<PushoverNotifier>, health),
    )))
}

fn new_climate_telemetry_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.climate_telemetry else {
        return Ok(None);
    };

    let homeassistant = settings
        .homeassistant
        .as_ref()
        .context("Climate telemetry requires Home Assistant")?;

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let climate = homeassistant.new_climate(&config.entity_id, settings.http_timeout_secs)?;
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let name = bridge::climate_telemetry::NAME;
    let (side_effects, rx) = SideEffects::channel(name, SIDE_EFFECT_CAPACITY);

    Ok(Some(supervised(
        name,
        config.interval_secs,
        ClimateTelemetry::new(climate, store, &config.node),
        side_effects,
        SideEffectRunner::new(name, rx, None::<PushoverNotifier>, health),
    )))
}

fn new_solaredge_loop(settings: &Settings) -> anyhow::Result<Option<impl Future<Output = ()> + use<>>> {
    let Some(config) = &settings.solaredge else {
        return Ok(None);
    };

    let store = settings.emoncms.new_client(settings.http_timeout_secs)?;
    let client = SunSpecClient::new(&config.host, config.port, config.unit, settings.http_timeout_secs);
    let health = new_health_ping(config.health_check_url.as_deref(), settings.http_timeout_secs)?;

    let name = bridge::solaredge::NAME;
    let (side_effects, rx) = SideEffects::channel(name, SIDE_EFFECT_CAPACITY);

    Ok(Some(supervised(
        name,
        config.interval_secs,
        SolarEdgeBridge::new(config, client, store),
        side_effects,
        SideEffectRunner::new(name, rx, None::<PushoverNotifier>, health),
    )))
}

fn new_health_ping(url: Option<&str>, timeout_secs: u64) -> anyhow::Result<Option<HealthcheckPing>> {
    url.map(|url| HealthcheckPing::new(url, timeout_secs)).transpose()
}

async fn supervised(
    name: &'static str,
    interval_secs: u64,
    job: impl Tick,
    side_effects: SideEffects,
    side_effect_runner: SideEffectRunner<PushoverNotifier, HealthcheckPing>,
) {
    let scheduler = Scheduler::new(name, Duration::from_secs(interval_secs), side_effects);

    tokio::join!(scheduler.run(job), side_effect_runner.run());
}

async fn run_if_configured(exec: Option<impl Future<Output = ()>>) {
    match exec {
        Some(exec) => exec.await,
        None => std::future::pending().await,
    }
}
