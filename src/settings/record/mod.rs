//! Durable bus configuration and its packed byte layout.
//!
//! ```text
//! offset  size  field
//! 0       1     num_busses
//! 1       6     bus_config[0]  (enabled u8, listen_only u8, bitrate u32 LE)
//! 7       6     bus_config[1]
//! 13      6     bus_config[2]
//! 19      2     bridged[0], bridged[1]
//! ```
//!
//! There is no version field: any layout change breaks settings written by
//! earlier firmware.
use crate::core::STORED_BUS_SLOTS;

/// Encoded size of one [`BusConfig`].
pub const BUS_CONFIG_SIZE: usize = 6;

/// Encoded size of a [`SettingsRecord`].
pub const SETTINGS_RECORD_SIZE: usize = 1 + STORED_BUS_SLOTS * BUS_CONFIG_SIZE + 2;

//==================================================================================BUS_CONFIG
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Persisted state of one bus.
pub struct BusConfig {
    pub enabled: bool,
    /// Receive-only; transmission is refused.
    pub listen_only: bool,
    /// Bits per second.
    pub bitrate: u32,
}

impl BusConfig {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            listen_only: false,
            bitrate: 0,
        }
    }

    fn encode(&self, out: &mut [u8]) {
        out[0] = self.enabled as u8;
        out[1] = self.listen_only as u8;
        out[2..6].copy_from_slice(&self.bitrate.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            enabled: bytes[0] != 0,
            listen_only: bytes[1] != 0,
            bitrate: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        }
    }
}

//==================================================================================SETTINGS_RECORD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Full durable configuration.
pub struct SettingsRecord {
    /// How many of the compiled-in buses are active.
    pub num_busses: u8,
    pub bus_config: [BusConfig; STORED_BUS_SLOTS],
    /// Bus pair linked by the external bridge.
    pub bridged: [u8; 2],
}

impl SettingsRecord {
    /// Zero-valued record: no active bus, everything disabled.
    pub const fn new() -> Self {
        Self {
            num_busses: 0,
            bus_config: [BusConfig::new(); STORED_BUS_SLOTS],
            bridged: [0; 2],
        }
    }

    /// Bridged pair as a tuple.
    pub fn bridge(&self) -> (u8, u8) {
        (self.bridged[0], self.bridged[1])
    }

    /// Serialize into the packed layout.
    pub fn to_bytes(&self) -> [u8; SETTINGS_RECORD_SIZE] {
        let mut out = [0u8; SETTINGS_RECORD_SIZE];
        out[0] = self.num_busses;
        for (config, chunk) in self
            .bus_config
            .iter()
            .zip(out[1..1 + STORED_BUS_SLOTS * BUS_CONFIG_SIZE].chunks_exact_mut(BUS_CONFIG_SIZE))
        {
            config.encode(chunk);
        }
        out[SETTINGS_RECORD_SIZE - 2..].copy_from_slice(&self.bridged);
        out
    }

    /// Parse the packed layout. Any non-zero flag byte reads as `true`.
    pub fn from_bytes(bytes: &[u8; SETTINGS_RECORD_SIZE]) -> Self {
        let mut record = Self::new();
        record.num_busses = bytes[0];
        for (config, chunk) in record
            .bus_config
            .iter_mut()
            .zip(bytes[1..1 + STORED_BUS_SLOTS * BUS_CONFIG_SIZE].chunks_exact(BUS_CONFIG_SIZE))
        {
            *config = BusConfig::decode(chunk);
        }
        record.bridged = [
            bytes[SETTINGS_RECORD_SIZE - 2],
            bytes[SETTINGS_RECORD_SIZE - 1],
        ];
        record
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
