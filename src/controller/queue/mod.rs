//! Frame queue engine: the bounded receive/transmit FIFO pair of one bus and
//! its overflow counters.
//!
//! Receive queue: written by the interrupt handler only, read by any task.
//! Transmit queue: written by any task, read by the dispatcher only. Neither
//! side ever allocates.
use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;

use crate::core::CAN_QUEUE_SIZE;
use crate::error::QueueFull;
use crate::transport::frame::Frame;
use crate::transport::traits::bus_timer::{with_timeout, BusTimer};

/// Monotonic counter bumped from interrupt context inside a critical section.
struct OverflowCounter(BlockingMutex<CriticalSectionRawMutex, Cell<u32>>);

impl OverflowCounter {
    const fn new() -> Self {
        Self(BlockingMutex::new(Cell::new(0)))
    }

    fn increment(&self) {
        self.0.lock(|count| count.set(count.get().wrapping_add(1)));
    }

    fn get(&self) -> u32 {
        self.0.lock(|count| count.get())
    }
}

/// Receive and transmit queues of one bus.
pub struct BusQueues {
    rx: Channel<CriticalSectionRawMutex, Frame, CAN_QUEUE_SIZE>,
    tx: Channel<CriticalSectionRawMutex, Frame, CAN_QUEUE_SIZE>,
    rx_overflow: OverflowCounter,
    tx_overflow: OverflowCounter,
}

impl Default for BusQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl BusQueues {
    pub const fn new() -> Self {
        Self {
            rx: Channel::new(),
            tx: Channel::new(),
            rx_overflow: OverflowCounter::new(),
            tx_overflow: OverflowCounter::new(),
        }
    }

    /// Interrupt-side enqueue. Never blocks; a full queue counts an rx overflow.
    ///
    /// A task waiting in [`dequeue_rx`](Self::dequeue_rx) is woken by the
    /// channel and runs once the interrupt returns.
    pub fn enqueue_rx(&self, frame: Frame) -> Result<(), QueueFull> {
        self.rx.try_send(frame).map_err(|_| {
            self.rx_overflow.increment();
            QueueFull
        })
    }

    /// Task-side enqueue, waiting up to `timeout_ms` for a free slot. Expiry
    /// counts a tx overflow and drops the frame.
    pub async fn enqueue_tx<T: BusTimer>(
        &self,
        frame: Frame,
        timer: &T,
        timeout_ms: u32,
    ) -> Result<(), QueueFull> {
        match with_timeout(timer, timeout_ms, self.tx.send(frame)).await {
            Some(()) => Ok(()),
            None => {
                self.tx_overflow.increment();
                Err(QueueFull)
            }
        }
    }

    /// Wait up to `timeout_ms` for a received frame.
    ///
    /// Returns the frame and how many frames are still queued behind it.
    pub async fn dequeue_rx<T: BusTimer>(&self, timer: &T, timeout_ms: u32) -> Option<(Frame, usize)> {
        let frame = with_timeout(timer, timeout_ms, self.rx.receive()).await?;
        Some((frame, self.rx.len()))
    }

    /// Dispatcher-side dequeue; returns immediately.
    pub fn dequeue_tx_nonblocking(&self) -> Option<Frame> {
        self.tx.try_receive().ok()
    }

    /// Frames waiting in the receive queue.
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Frames waiting in the transmit queue.
    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    /// Frames dropped because the receive queue was full.
    pub fn rx_overflow_count(&self) -> u32 {
        self.rx_overflow.get()
    }

    /// Frames dropped because the transmit queue stayed full.
    pub fn tx_overflow_count(&self) -> u32 {
        self.tx_overflow.get()
    }
}
