use std::{fmt::Display, net::SocketAddr, time::Duration};

use tokio_modbus::prelude::*;

use crate::core::{Error, Result};

/// Holding registers of a SolarEdge inverter, read over Modbus TCP
#[derive(Debug, Clone)]
pub struct SunSpecClient {
    host: String,
    port: u16,
    unit: u8,
    timeout: Duration,
}

/// A contiguous range of holding registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRange {
    pub start: u16,
    pub count: u16,
}

impl SunSpecClient {
    pub fn new(host: &str, port: u16, unit: u8, timeout_secs: u64) -> Self {
        Self {
            host: host.to_owned(),
            port,
            unit,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn name(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reads all ranges over a single connection, in order. The inverter only serves one
    /// Modbus client at a time, so the connection is dropped right after.
    #[tracing::instrument(skip(self), fields(inverter = %self.name()))]
    pub async fn read(&self, ranges: &[RegisterRange]) -> Result<Vec<Vec<u16>>> {
        let address = self.resolve().await?;

        let mut ctx = tokio::time::timeout(self.timeout, tcp::connect_slave(address, Slave(self.unit)))
            .await
            .map_err(|_| self.unavailable("connect timed out"))?
            .map_err(|e| self.unavailable(e))?;

        let mut blocks = Vec::with_capacity(ranges.len());
        for range in ranges {
            let words = tokio::time::timeout(self.timeout, ctx.read_holding_registers(range.start, range.count))
                .await
                .map_err(|_| self.unavailable(format!("reading {} timed out", range.start)))?
                .map_err(|e| self.unavailable(e))?
                .map_err(|code| Error::device(self.name(), format!("exception {:?} at {}", code, range.start)))?;

            tracing::trace!("Read {} registers from {}", words.len(), range.start);
            blocks.push(words);
        }

        Ok(blocks)
    }

    async fn resolve(&self) -> Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| self.unavailable(e))?
            .next()
            .ok_or_else(|| self.unavailable("host did not resolve"))
    }

    fn unavailable(&self, reason: impl Display) -> Error {
        Error::unavailable(self.name(), reason)
    }
}
