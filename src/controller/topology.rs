//! Static wiring of every logical bus: pins, peripheral engine and interrupt.
use crate::core::{MAX_BUSSES, MAX_ENGINES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Hardware assignment of one logical bus.
pub struct BusTopology {
    pub pin_rx: u8,
    pub pin_tx: u8,
    /// Transceiver power/enable output, when the board has one.
    pub power_pin: Option<u8>,
    /// Peripheral engine (PIO block) running the bus.
    pub engine: u8,
    /// Interrupt vector raised by the engine.
    pub irq: u16,
}

impl BusTopology {
    pub const fn new(pin_rx: u8, pin_tx: u8, engine: u8, irq: u16) -> Self {
        Self {
            pin_rx,
            pin_tx,
            power_pin: None,
            engine,
            irq,
        }
    }

    pub const fn with_power_pin(mut self, pin: u8) -> Self {
        self.power_pin = Some(pin);
        self
    }
}

/// Resolve which bus each engine interrupt belongs to.
///
/// Engines outside `0..MAX_ENGINES` are not mapped; the first bus wins if two
/// buses name the same engine.
pub(crate) fn engine_map(topology: &[BusTopology; MAX_BUSSES]) -> [Option<u8>; MAX_ENGINES] {
    let mut map = [None; MAX_ENGINES];
    for (bus, entry) in topology.iter().enumerate() {
        if let Some(slot) = map.get_mut(entry.engine as usize) {
            if slot.is_none() {
                *slot = Some(bus as u8);
            }
        }
    }
    map
}
