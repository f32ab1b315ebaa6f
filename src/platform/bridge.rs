//! Activation hook of the external bridge that forwards traffic between two
//! buses. Only the pairing identity is owned here.

/// Receives the bridged bus pair restored from durable settings.
pub trait BridgeHook {
    fn set_bridge(&mut self, bus_a: u8, bus_b: u8);
}
