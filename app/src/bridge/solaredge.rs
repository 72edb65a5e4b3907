use serde::Deserialize;

use crate::adapter::solaredge::{RegisterRange, SunSpecClient};
use crate::automation::{Tick, TickOutcome};
use crate::core::{Error, Result};
use crate::port::FeedStore;

pub const NAME: &str = "solaredge";

#[derive(Debug, Clone, Deserialize)]
pub struct SolarEdgeConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_unit")]
    pub unit: u8,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Prefix of the node names, e.g. `RED` publishes to `RED-INVERTER` and `RED-METER`
    pub phase: String,
    #[serde(default = "enabled")]
    pub inverter: bool,
    #[serde(default = "enabled")]
    pub meter: bool,
    pub health_check_url: Option<String>,
}

fn default_port() -> u16 {
    1502
}

fn default_unit() -> u8 {
    1
}

fn default_interval_secs() -> u64 {
    5
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    U16,
    I16,
    U32,
}

/// A value inside a block. Offsets are relative to the block start.
#[derive(Debug, Clone, Copy)]
struct Register {
    name: &'static str,
    offset: usize,
    kind: Kind,
    scale: Option<usize>,
}

const fn reg(name: &'static str, offset: usize, kind: Kind, scale: usize) -> Register {
    Register {
        name,
        offset,
        kind,
        scale: Some(scale),
    }
}

const fn unscaled(name: &'static str, offset: usize) -> Register {
    Register {
        name,
        offset,
        kind: Kind::U16,
        scale: None,
    }
}

/// One SunSpec model read with a single request and posted as one node
#[derive(Debug)]
pub struct Block {
    node: &'static str,
    range: RegisterRange,
    registers: &'static [Register],
    /// Published with the sign flipped so that import is positive
    inverted: &'static [&'static str],
}

pub static INVERTER: Block = Block {
    node: "INVERTER",
    range: RegisterRange { start: 40071, count: 38 },
    registers: &[
        reg("current", 0, Kind::U16, 4),
        reg("l1_current", 1, Kind::U16, 4),
        reg("l2_current", 2, Kind::U16, 4),
        reg("l3_current", 3, Kind::U16, 4),
        reg("l1_voltage", 5, Kind::U16, 11),
        reg("l2_voltage", 6, Kind::U16, 11),
        reg("l3_voltage", 7, Kind::U16, 11),
        reg("l1n_voltage", 8, Kind::U16, 11),
        reg("l2n_voltage", 9, Kind::U16, 11),
        reg("l3n_voltage", 10, Kind::U16, 11),
        reg("power_ac", 12, Kind::I16, 13),
        reg("frequency", 14, Kind::U16, 15),
        reg("power_apparent", 16, Kind::I16, 17),
        reg("power_reactive", 18, Kind::I16, 19),
        reg("power_factor", 20, Kind::I16, 21),
        reg("energy_total", 22, Kind::U32, 24),
        reg("current_dc", 25, Kind::U16, 26),
        reg("voltage_dc", 27, Kind::U16, 28),
        reg("power_dc", 29, Kind::I16, 30),
        reg("temperature", 32, Kind::I16, 35),
        unscaled("status", 36),
        unscaled("vendor_status", 37),
    ],
    inverted: &[],
};

pub static METER: Block = Block {
    node: "METER",
    range: RegisterRange { start: 40190, count: 53 },
    registers: &[
        reg("current", 0, Kind::I16, 4),
        reg("l1_current", 1, Kind::I16, 4),
        reg("l2_current", 2, Kind::I16, 4),
        reg("l3_current", 3, Kind::I16, 4),
        reg("voltage_ln", 5, Kind::I16, 13),
        reg("l1n_voltage", 6, Kind::I16, 13),
        reg("l2n_voltage", 7, Kind::I16, 13),
        reg("l3n_voltage", 8, Kind::I16, 13),
        reg("voltage_ll", 9, Kind::I16, 13),
        reg("l12_voltage", 10, Kind::I16, 13),
        reg("l23_voltage", 11, Kind::I16, 13),
        reg("l31_voltage", 12, Kind::I16, 13),
        reg("frequency", 14, Kind::I16, 15),
        reg("power", 16, Kind::I16, 20),
        reg("l1_power", 17, Kind::I16, 20),
        reg("l2_power", 18, Kind::I16, 20),
        reg("l3_power", 19, Kind::I16, 20),
        reg("power_apparent", 21, Kind::I16, 25),
        reg("power_reactive", 26, Kind::I16, 30),
        reg("power_factor", 31, Kind::I16, 35),
        reg("export_energy_active", 36, Kind::U32, 52),
        reg("import_energy_active", 44, Kind::U32, 52),
    ],
    inverted: &["l1_power", "l2_power", "l3_power"],
};

/// Publishes inverter and meter readings under `{phase}-INVERTER` and `{phase}-METER`
pub struct SolarEdgeBridge<F: FeedStore> {
    client: SunSpecClient,
    store: F,
    phase: String,
    blocks: Vec<&'static Block>,
}

impl<F: FeedStore> SolarEdgeBridge<F> {
    pub fn new(config: &SolarEdgeConfig, client: SunSpecClient, store: F) -> Self {
        let blocks = [(config.inverter, &INVERTER), (config.meter, &METER)]
            .into_iter()
            .filter_map(|(enabled, block)| enabled.then_some(block))
            .collect();

        Self {
            client,
            store,
            phase: config.phase.clone(),
            blocks,
        }
    }
}

impl<F: FeedStore> Tick for SolarEdgeBridge<F> {
    #[tracing::instrument(skip(self), fields(phase = %self.phase))]
    async fn tick(&self) -> Result<TickOutcome> {
        let ranges: Vec<RegisterRange> = self.blocks.iter().map(|block| block.range).collect();
        let readings = self.client.read(&ranges).await?;

        for (block, words) in self.blocks.iter().zip(readings) {
            let node = format!("{}-{}", self.phase, block.node);
            let values = decode(block, &words).map_err(|e| Error::device(node.as_str(), e))?;
            tracing::debug!("Publishing {} values for {}", values.len(), node);

            if let Some((_, power)) = values.iter().find(|(name, _)| *name == "power_ac" || *name == "power") {
                infrastructure::meter::set("solaredge_power", *power, &[("node", node.as_str())]);
            }

            self.store.post(&node, &values).await?;
        }

        Ok(TickOutcome::Unchanged)
    }
}

/// Scaled values of a block. Registers the device marks as not implemented are left out.
fn decode(block: &Block, words: &[u16]) -> std::result::Result<Vec<(&'static str, f64)>, String> {
    if words.len() < block.range.count as usize {
        return Err(format!(
            "incomplete {} block, {} of {} registers",
            block.node,
            words.len(),
            block.range.count
        ));
    }

    let values = block
        .registers
        .iter()
        .filter_map(|register| {
            let value = scaled(register, words)?;
            let value = if block.inverted.contains(&register.name) { -value } else { value };
            Some((register.name, value))
        })
        .collect();

    Ok(values)
}

fn scaled(register: &Register, words: &[u16]) -> Option<f64> {
    let value = raw(register, words)?;

    match register.scale {
        None => Some(value),
        Some(offset) => {
            let scale = *words.get(offset)? as i16;
            match scale {
                i16::MIN => None,
                scale if scale < 0 => Some(value / 10f64.powi(-(scale as i32))),
                _ => Some(value * 10f64.powi(scale as i32)),
            }
        }
    }
}

fn raw(register: &Register, words: &[u16]) -> Option<f64> {
    let word = *words.get(register.offset)?;

    match register.kind {
        Kind::U16 => (word != u16::MAX).then_some(word as f64),
        Kind::I16 => (word as i16 != i16::MIN).then_some(word as i16 as f64),
        Kind::U32 => {
            let low = *words.get(register.offset + 1)?;
            let value = (u32::from(word) << 16) | u32::from(low);
            (value != u32::MAX).then_some(value as f64)
        }
    }
}
