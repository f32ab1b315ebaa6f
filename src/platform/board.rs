//! Board-level hardware the controller touches directly: transceiver power
//! pins, interrupt controller and watchdog. Implemented by the firmware's BSP.

/// GPIO, interrupt and reset primitives.
pub trait Board {
    /// Configure `pin` as an output driven low.
    fn init_power_pin(&mut self, pin: u8);

    /// Drive a transceiver power pin.
    fn set_power_pin(&mut self, pin: u8, on: bool);

    /// Reserve the hardware resources (e.g. PIO state machines) a bus uses on
    /// `engine`. Boards that share nothing can keep the default.
    fn claim_engine(&mut self, engine: u8) {
        let _ = engine;
    }

    /// Enable or mask `irq` in the interrupt controller.
    fn set_irq_enabled(&mut self, irq: u16, enabled: bool);

    /// Set the priority of `irq`.
    fn set_irq_priority(&mut self, irq: u16, priority: u8);

    /// Route `irq` raised by `engine` to `core` only: set it in that core's
    /// interrupt-enable register and clear it in every other core's.
    fn route_irq_to_core(&mut self, engine: u8, irq: u16, core: u8);

    /// Arm the watchdog so the device resets as soon as possible.
    fn arm_watchdog_reset(&mut self);
}

/// Visual bus-activity indicator.
pub trait ActivityIndicator {
    fn blink(&mut self);
}
