//! Interrupt entry points. Each engine's vector is bound by the firmware
//! (e.g. `#[interrupt] fn PIO0_IRQ_0()`) to one of these.
use crate::platform::board::Board;
use crate::platform::storage::SettingsStorage;
use crate::transport::frame::Frame;
use crate::transport::traits::bus_timer::BusTimer;
use crate::transport::traits::can_driver::{CanDriver, DriverEvent};

use super::{BusQueues, BusSlot, BusState, CanController};

impl<D, B, S, T> CanController<D, B, S, T>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
{
    /// Service the driver of `bus`. Unknown or never brought-up buses are ignored.
    pub fn on_interrupt(&self, bus: u8) {
        if let Some(slot) = self.buses.get(bus as usize) {
            slot.service();
        }
    }

    /// Service whichever bus runs on `engine`.
    pub fn on_engine_interrupt(&self, engine: u8) {
        if let Some(Some(bus)) = self.engine_map.get(engine as usize) {
            self.on_interrupt(*bus);
        }
    }
}

impl<D: CanDriver> BusSlot<D> {
    /// Run the driver's service routine once, under the driver lock.
    fn service(&self) {
        self.hw.lock(|cell| {
            // Only re-entered if a handler were nested inside the lock.
            let Ok(mut hw) = cell.try_borrow_mut() else {
                return;
            };
            if hw.state == BusState::Uninitialized {
                return;
            }
            hw.driver
                .service_pending(|event| on_driver_event(&self.queues, event));
        });
    }
}

/// Route one driver notification. Received frames go to the receive queue,
/// dropped and counted when it is full.
pub(super) fn on_driver_event(queues: &BusQueues, event: DriverEvent<'_>) {
    match event {
        DriverEvent::Received(msg) => {
            let _ = queues.enqueue_rx(Frame::from_raw(msg));
        }
        DriverEvent::Transmitted(_) | DriverEvent::Error => {}
    }
}
