//! Transmit dispatcher: the single task draining every bus's transmit queue
//! into its driver.
use core::convert::Infallible;

use crate::core::TX_IDLE_WAIT_MS;
use crate::platform::board::{ActivityIndicator, Board};
use crate::platform::storage::SettingsStorage;
use crate::transport::traits::bus_timer::{with_timeout, BusTimer};
use crate::transport::traits::can_driver::CanDriver;

use super::interrupt::on_driver_event;
use super::CanController;

/// Runner that drives the transmit loop.
///
/// Exactly one dispatcher may run per controller; it is the only consumer of
/// the transmit queues.
pub struct TxDispatcher<'a, D, B, S, T, A>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
    A: ActivityIndicator,
{
    controller: &'a CanController<D, B, S, T>,
    indicator: A,
}

impl<'a, D, B, S, T, A> TxDispatcher<'a, D, B, S, T, A>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
    A: ActivityIndicator,
{
    pub fn new(controller: &'a CanController<D, B, S, T>, indicator: A) -> Self {
        Self {
            controller,
            indicator,
        }
    }

    /// Replay the stored bus configuration, then dispatch forever.
    pub async fn drive(mut self) -> Infallible {
        self.controller.restore_buses();

        #[cfg(feature = "defmt")]
        defmt::info!("CAN TX dispatcher running");

        loop {
            self.step().await;
        }
    }

    /// One dispatcher iteration: at most one frame per active bus.
    ///
    /// Blinks the indicator when anything was handed to a driver, otherwise
    /// sleeps until `send_can` signals or [`TX_IDLE_WAIT_MS`] elapses.
    /// Returns how many frames were dequeued.
    pub async fn step(&mut self) -> usize {
        let dispatched = self.controller.dispatch_pending();
        if dispatched > 0 {
            self.indicator.blink();
        } else {
            let _ = with_timeout(
                &self.controller.timer,
                TX_IDLE_WAIT_MS,
                self.controller.tx_wake.wait(),
            )
            .await;
        }
        dispatched
    }
}

impl<D, B, S, T> CanController<D, B, S, T>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
{
    /// Hand the head of each active transmit queue to its driver.
    fn dispatch_pending(&self) -> usize {
        let mut dispatched = 0;

        for (_bus, slot) in self.buses.iter().enumerate().take(self.active_busses()) {
            let Some(frame) = slot.queues.dequeue_tx_nonblocking() else {
                continue;
            };
            dispatched += 1;

            let raw = frame.to_raw();
            let result = slot.hw.lock(|cell| {
                let mut hw = cell.borrow_mut();
                // A busy engine may be sitting on a completion whose interrupt
                // has not run yet; service it once before transmitting.
                if !hw.driver.check_transmit() {
                    hw.driver
                        .service_pending(|event| on_driver_event(&slot.queues, event));
                }
                hw.driver.transmit(&raw)
            });

            if let Err(_err) = result {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "CAN{}: Failed to send message {:x}: {}",
                    _bus,
                    frame.id,
                    defmt::Debug2Format(&_err)
                );
            }
        }

        dispatched
    }
}
