//! Contract of the bit-level CAN engine (a can2040-style PIO driver). The
//! controller owns one instance per bus and never looks inside it.
use crate::transport::frame::RawMessage;

/// Notification raised by the driver while servicing its interrupt.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverEvent<'a> {
    /// A frame was received from the bus.
    Received(&'a RawMessage),
    /// A queued frame left the controller.
    Transmitted(&'a RawMessage),
    /// The engine detected a bus or parse error.
    Error,
}

/// Counters maintained by the driver itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatistics {
    pub rx_total: u32,
    pub tx_total: u32,
    pub tx_attempt: u32,
    pub parse_error: u32,
}

/// Low-level CAN engine driving one bus.
///
/// Methods are called with the per-bus driver lock held, from task context and
/// from the bus interrupt, so implementations never observe two calls at once.
pub trait CanDriver {
    type Error: core::fmt::Debug;

    /// Bind the driver to its peripheral engine. Called once per boot.
    fn setup(&mut self, engine: u8);

    /// Start bus activity at `bitrate` on the given pins.
    fn start(&mut self, bitrate: u32, pin_rx: u8, pin_tx: u8);

    /// Stop bus activity.
    fn stop(&mut self);

    /// Whether a transmit slot is free right now.
    fn check_transmit(&self) -> bool;

    /// Queue one message for transmission.
    fn transmit(&mut self, msg: &RawMessage) -> Result<(), Self::Error>;

    /// Run the interrupt service routine once, reporting every pending
    /// notification through `notify`.
    ///
    /// This replaces a registered receive callback: whoever services the
    /// driver decides where notifications go.
    fn service_pending<F: FnMut(DriverEvent<'_>)>(&mut self, notify: F);

    /// Driver-maintained counters.
    fn statistics(&self) -> BusStatistics;
}
