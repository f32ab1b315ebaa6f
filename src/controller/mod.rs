//! Multi-bus CAN controller: per-bus driver registry, frame API, management
//! API and introspection.
//!
//! One [`CanController`] owns every bus of the board. It is built once,
//! placed in a `static` (e.g. through `static_cell::StaticCell`) and shared by
//! reference between:
//!
//! * the bus interrupt handlers ([`CanController::on_interrupt`]);
//! * the transmit dispatcher task ([`TxDispatcher::drive`]);
//! * any application task using the frame or management API.
//!
//! Startup order is a hard precondition: construct the controller, await
//! [`CanController::load_settings`], then spawn the dispatcher and the tasks
//! calling the API.
//!
//! # Example
//!
//! ```rust,ignore
//! static CAN: StaticCell<CanController<Pio2040, Rp2040Board, LfsStorage, EmbassyTimer>> =
//!     StaticCell::new();
//!
//! let can = CAN.init(CanController::new(TOPOLOGY, drivers, board, storage, EmbassyTimer));
//! can.load_settings(&mut bridge).await.ok();
//! spawner.spawn(can_tx_task(can.dispatcher(led))).unwrap();
//!
//! #[interrupt]
//! fn PIO0_IRQ_0() {
//!     CAN_REF.get().on_engine_interrupt(0);
//! }
//! ```
pub mod queue;
pub mod topology;

mod dispatch;
mod interrupt;
mod lifecycle;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;

use crate::core::{CAN_QUEUE_TIMEOUT_MS, DEFAULT_BUS_SPEED, MAX_BUSSES, MAX_ENGINES};
use crate::error::{ConfigError, FrameError, PersistError};
use crate::platform::board::{ActivityIndicator, Board};
use crate::platform::bridge::BridgeHook;
use crate::platform::storage::SettingsStorage;
use crate::settings::{BusConfig, SettingsRecord, SettingsStore};
use crate::transport::frame::Frame;
use crate::transport::traits::bus_timer::BusTimer;
use crate::transport::traits::can_driver::{BusStatistics, CanDriver};

pub use dispatch::TxDispatcher;
pub use queue::BusQueues;
pub use topology::BusTopology;

//==================================================================================BUS_STATE
/// Lifecycle of one bus within a boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// Driver never touched.
    Uninitialized,
    /// Engine claimed, driver set up, interrupt routed; never started.
    HardwareConfigured,
    /// Driver stopped after running.
    Stopped,
    /// Driver running.
    Running,
}

/// Driver of one bus and where it stands in its lifecycle.
struct BusHardware<D> {
    driver: D,
    state: BusState,
}

/// Registry entry of one bus.
struct BusSlot<D> {
    /// Shared with the bus interrupt; the critical section serialises the
    /// dispatcher nudge against a genuine interrupt.
    hw: BlockingMutex<CriticalSectionRawMutex, RefCell<BusHardware<D>>>,
    queues: BusQueues,
}

impl<D> BusSlot<D> {
    fn new(driver: D) -> Self {
        Self {
            hw: BlockingMutex::new(RefCell::new(BusHardware {
                driver,
                state: BusState::Uninitialized,
            })),
            queues: BusQueues::new(),
        }
    }
}

//==================================================================================CAN_CONTROLLER
/// Bus controller for up to [`MAX_BUSSES`] CAN buses.
pub struct CanController<D, B, S, T>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
{
    topology: [BusTopology; MAX_BUSSES],
    /// Engine number → bus index, resolved once at construction.
    engine_map: [Option<u8>; MAX_ENGINES],
    buses: [BusSlot<D>; MAX_BUSSES],
    board: BlockingMutex<CriticalSectionRawMutex, RefCell<B>>,
    settings: SettingsStore<S>,
    timer: T,
    /// Wakes the dispatcher after `send_can` queued a frame.
    tx_wake: Signal<CriticalSectionRawMutex, ()>,
}

impl<D, B, S, T> CanController<D, B, S, T>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
{
    /// Build the registry. Nothing touches the hardware yet; settings start
    /// zeroed until [`load_settings`](Self::load_settings) runs.
    pub fn new(
        topology: [BusTopology; MAX_BUSSES],
        drivers: [D; MAX_BUSSES],
        board: B,
        storage: S,
        timer: T,
    ) -> Self {
        Self {
            engine_map: topology::engine_map(&topology),
            topology,
            buses: drivers.map(BusSlot::new),
            board: BlockingMutex::new(RefCell::new(board)),
            settings: SettingsStore::new(storage),
            timer,
            tx_wake: Signal::new(),
        }
    }

    /// Build the transmit dispatcher driving this controller.
    pub fn dispatcher<A: ActivityIndicator>(&self, indicator: A) -> TxDispatcher<'_, D, B, S, T, A> {
        TxDispatcher::new(self, indicator)
    }

    //==============================================================================SETTINGS
    /// Restore the durable settings. Startup only, before any API task runs.
    pub async fn load_settings<H: BridgeHook>(
        &self,
        bridge: &mut H,
    ) -> Result<SettingsRecord, PersistError> {
        self.settings.load(bridge).await
    }

    /// Write the live settings to durable storage.
    pub async fn store_settings(&self) -> Result<(), PersistError> {
        self.settings.store(&self.timer).await
    }

    /// Copy of the live settings record.
    pub fn settings(&self) -> SettingsRecord {
        self.settings.snapshot()
    }

    /// Persist after a configuration change. Failures are logged by the
    /// store; the live record stays authoritative.
    async fn persist(&self) {
        let _ = self.settings.store(&self.timer).await;
    }

    /// Remember which two buses the external bridge links.
    pub async fn store_bridge_settings(&self, bridge: (u8, u8)) {
        let changed = self.settings.update(|record| {
            if record.bridge() == bridge {
                return false;
            }
            record.bridged = [bridge.0, bridge.1];
            true
        });
        if changed {
            self.persist().await;
        }
    }

    //==============================================================================BUS_INDEX
    /// Bus currently configured: below the compiled maximum and the stored count.
    fn configured_bus(&self, bus: u8) -> Result<usize, ConfigError> {
        let idx = bus as usize;
        if idx >= MAX_BUSSES || bus >= self.settings.snapshot().num_busses {
            #[cfg(feature = "defmt")]
            defmt::error!("Invalid CAN bus number: {}", bus);
            return Err(ConfigError::InvalidBus { bus });
        }
        Ok(idx)
    }

    /// Bus compiled in, whatever the stored count says.
    fn compiled_bus(&self, bus: u8) -> Result<usize, ConfigError> {
        let idx = bus as usize;
        if idx >= MAX_BUSSES {
            #[cfg(feature = "defmt")]
            defmt::error!("Invalid CAN bus number: {}", bus);
            return Err(ConfigError::InvalidBus { bus });
        }
        Ok(idx)
    }

    /// Number of buses served: the stored count capped by the compiled maximum.
    fn active_busses(&self) -> usize {
        (self.settings.snapshot().num_busses as usize).min(MAX_BUSSES)
    }

    fn bus_config(&self, idx: usize) -> BusConfig {
        self.settings.snapshot().bus_config[idx]
    }

    fn with_hw<R>(&self, idx: usize, f: impl FnOnce(&mut BusHardware<D>) -> R) -> R {
        self.buses[idx].hw.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    fn with_board<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.board.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    //==============================================================================FRAME_API
    /// Queue `frame` for transmission on `bus`.
    ///
    /// Waits at most [`CAN_QUEUE_TIMEOUT_MS`] for room; on expiry the frame is
    /// dropped and counted as a tx overflow. Retrying is the caller's call.
    pub async fn send_can(&self, bus: u8, frame: Frame) -> Result<(), FrameError> {
        let idx = self.configured_bus(bus)?;
        let config = self.bus_config(idx);
        if !config.enabled {
            #[cfg(feature = "defmt")]
            defmt::error!("CAN bus {} is not enabled", bus);
            return Err(FrameError::NotEnabled { bus });
        }
        if config.listen_only {
            #[cfg(feature = "defmt")]
            defmt::error!("CAN bus {} is in listen-only mode", bus);
            return Err(FrameError::ListenOnly { bus });
        }

        self.buses[idx]
            .queues
            .enqueue_tx(frame, &self.timer, CAN_QUEUE_TIMEOUT_MS)
            .await
            .map_err(|_| {
                #[cfg(feature = "defmt")]
                defmt::error!("CAN bus {}: TX queue full", bus);
                FrameError::QueueFull { bus }
            })?;

        self.tx_wake.signal(());
        Ok(())
    }

    /// Wait up to `timeout_ms` for a frame received on `bus`.
    ///
    /// Returns the frame and the number of frames still queued. An invalid or
    /// disabled bus still waits out the timeout before failing, so polling
    /// loops do not spin.
    pub async fn receive(&self, bus: u8, timeout_ms: u32) -> Result<(Frame, usize), FrameError> {
        let idx = match self.configured_bus(bus) {
            Ok(idx) => idx,
            Err(err) => {
                self.timer.delay_ms(timeout_ms).await;
                return Err(err.into());
            }
        };
        if !self.bus_config(idx).enabled {
            self.timer.delay_ms(timeout_ms).await;
            return Err(FrameError::NotEnabled { bus });
        }

        self.buses[idx]
            .queues
            .dequeue_rx(&self.timer, timeout_ms)
            .await
            .ok_or(FrameError::Timeout)
    }

    //==============================================================================MANAGEMENT_QUERIES
    /// Whether `bus` is enabled. `false` for an invalid bus.
    pub fn is_enabled(&self, bus: u8) -> bool {
        self.configured_bus(bus)
            .map(|idx| self.bus_config(idx).enabled)
            .unwrap_or(false)
    }

    /// Whether `bus` is receive-only. `false` for an invalid bus.
    pub fn is_listen_only(&self, bus: u8) -> bool {
        self.configured_bus(bus)
            .map(|idx| self.bus_config(idx).listen_only)
            .unwrap_or(false)
    }

    /// Stored bitrate of `bus`, [`DEFAULT_BUS_SPEED`] for an invalid bus.
    pub fn bitrate(&self, bus: u8) -> u32 {
        self.configured_bus(bus)
            .map(|idx| self.bus_config(idx).bitrate)
            .unwrap_or(DEFAULT_BUS_SPEED)
    }

    /// Stored number of active buses.
    pub fn num_busses(&self) -> u8 {
        self.settings.snapshot().num_busses
    }

    /// Lifecycle state of `bus`.
    pub fn bus_state(&self, bus: u8) -> Result<BusState, ConfigError> {
        let idx = self.compiled_bus(bus)?;
        Ok(self.with_hw(idx, |hw| hw.state))
    }

    //==============================================================================INTROSPECTION
    /// Frames waiting in the receive queue of `bus`.
    pub fn rx_buffered_frames(&self, bus: u8) -> Result<usize, ConfigError> {
        let idx = self.compiled_bus(bus)?;
        Ok(self.buses[idx].queues.rx_len())
    }

    /// Frames waiting in the transmit queue of `bus`.
    pub fn tx_buffered_frames(&self, bus: u8) -> Result<usize, ConfigError> {
        let idx = self.compiled_bus(bus)?;
        Ok(self.buses[idx].queues.tx_len())
    }

    /// Received frames dropped on `bus` since boot. `0` for an unknown bus.
    pub fn rx_overflow_count(&self, bus: u8) -> u32 {
        self.buses
            .get(bus as usize)
            .map_or(0, |slot| slot.queues.rx_overflow_count())
    }

    /// Frames `send_can` could not queue on `bus` since boot. `0` for an unknown bus.
    pub fn tx_overflow_count(&self, bus: u8) -> u32 {
        self.buses
            .get(bus as usize)
            .map_or(0, |slot| slot.queues.tx_overflow_count())
    }

    /// Driver counters of `bus`.
    pub fn statistics(&self, bus: u8) -> Result<BusStatistics, ConfigError> {
        let idx = self.compiled_bus(bus)?;
        Ok(self.with_hw(idx, |hw| hw.driver.statistics()))
    }
}
