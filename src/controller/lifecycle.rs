//! Bus lifecycle: one-time hardware bring-up, start/stop, power control, and
//! the management operations that drive them.
//!
//! ```text
//! Uninitialized ──bring-up──▶ HardwareConfigured ──start──▶ Running ──stop──▶ Stopped
//!                                                              ▲                  │
//!                                                              └──────start───────┘
//! ```
//!
//! Bring-up happens at most once per bus per boot; the only way to undo it
//! is a reset.
use core::convert::Infallible;

use crate::core::{CAN_IRQ_CORE, CAN_IRQ_PRIORITY, MAX_BUSSES};
use crate::error::ConfigError;
use crate::platform::board::Board;
use crate::platform::storage::SettingsStorage;
use crate::transport::traits::bus_timer::BusTimer;
use crate::transport::traits::can_driver::CanDriver;

use super::{BusState, CanController};

impl<D, B, S, T> CanController<D, B, S, T>
where
    D: CanDriver,
    B: Board,
    S: SettingsStorage,
    T: BusTimer,
{
    //==============================================================================BRING_UP
    /// Claim the engine, set up the driver and route the bus interrupt.
    /// No-op once the bus left `Uninitialized`.
    fn bring_up(&self, idx: usize) {
        let claimed = self.with_hw(idx, |hw| {
            if hw.state != BusState::Uninitialized {
                return false;
            }
            hw.state = BusState::HardwareConfigured;
            true
        });
        if !claimed {
            return;
        }

        let topo = self.topology[idx];

        self.with_board(|board| {
            if let Some(pin) = topo.power_pin {
                board.init_power_pin(pin);
            }
            board.claim_engine(topo.engine);
        });

        self.with_hw(idx, |hw| hw.driver.setup(topo.engine));

        // Mask while rerouting; the handler must only ever run on CAN_IRQ_CORE.
        self.with_board(|board| {
            board.set_irq_enabled(topo.irq, false);
            board.route_irq_to_core(topo.engine, topo.irq, CAN_IRQ_CORE);
            board.set_irq_priority(topo.irq, CAN_IRQ_PRIORITY);
            board.set_irq_enabled(topo.irq, true);
        });

        #[cfg(feature = "defmt")]
        defmt::debug!("CAN{}: hardware configured on engine {}", idx, topo.engine);
    }

    /// Bring the bus up if needed, power its transceiver and start the driver.
    fn start_bus(&self, idx: usize, bitrate: u32) {
        self.bring_up(idx);
        self.set_power(idx, true);

        let topo = self.topology[idx];
        self.with_hw(idx, |hw| {
            hw.driver.start(bitrate, topo.pin_rx, topo.pin_tx);
            hw.state = BusState::Running;
        });

        #[cfg(feature = "defmt")]
        defmt::info!("CAN{}: started at {} bit/s", idx, bitrate);
    }

    /// Stop the driver if it runs. Power is left to the caller.
    fn stop_bus(&self, idx: usize) {
        self.with_hw(idx, |hw| {
            if hw.state == BusState::Running {
                hw.driver.stop();
                hw.state = BusState::Stopped;
            }
        });
    }

    fn set_power(&self, idx: usize, on: bool) {
        if let Some(pin) = self.topology[idx].power_pin {
            self.with_board(|board| board.set_power_pin(pin, on));
        }
    }

    //==============================================================================BOOT
    /// Replay the loaded settings: bring up every active bus and start the
    /// ones stored as enabled. Buses already running are left as they are.
    pub fn restore_buses(&self) {
        let record = self.settings.snapshot();
        let active = self.active_busses();

        #[cfg(feature = "defmt")]
        defmt::info!("Restoring {} CAN bus(ses)", active);

        for (idx, config) in record.bus_config.iter().enumerate().take(active) {
            self.bring_up(idx);
            let running = self.with_hw(idx, |hw| hw.state == BusState::Running);
            if config.enabled && !running {
                self.start_bus(idx, config.bitrate);
            }
        }
    }

    //==============================================================================MANAGEMENT
    /// Start `bus` at `bitrate` and persist it as enabled.
    ///
    /// On a bus already enabled this only changes the bitrate.
    pub async fn enable(&self, bus: u8, bitrate: u32) -> Result<(), ConfigError> {
        let idx = self.configured_bus(bus)?;
        if self.bus_config(idx).enabled {
            #[cfg(feature = "defmt")]
            defmt::warn!("CAN bus {} already enabled - resetting", bus);
            return self.set_bitrate(bus, bitrate).await;
        }

        self.start_bus(idx, bitrate);
        self.settings.update(|record| {
            let config = &mut record.bus_config[idx];
            config.bitrate = bitrate;
            config.enabled = true;
        });
        self.persist().await;
        Ok(())
    }

    /// Stop `bus`, cut its transceiver power and persist it as disabled.
    ///
    /// Disabling a bus that is already disabled writes nothing.
    pub async fn disable(&self, bus: u8) -> Result<(), ConfigError> {
        let idx = self.configured_bus(bus)?;

        self.stop_bus(idx);
        self.set_power(idx, false);

        let was_enabled = self
            .settings
            .update(|record| core::mem::replace(&mut record.bus_config[idx].enabled, false));
        if was_enabled {
            #[cfg(feature = "defmt")]
            defmt::info!("CAN bus {} disabled", bus);
            self.persist().await;
        }
        Ok(())
    }

    /// Change the bitrate of `bus`, restarting the driver if it is enabled.
    pub async fn set_bitrate(&self, bus: u8, bitrate: u32) -> Result<(), ConfigError> {
        let idx = self.configured_bus(bus)?;

        if self.bus_config(idx).enabled {
            self.stop_bus(idx);
            self.start_bus(idx, bitrate);
        }

        let changed = self.settings.update(|record| {
            let config = &mut record.bus_config[idx];
            let changed = config.bitrate != bitrate;
            config.bitrate = bitrate;
            changed
        });
        if changed {
            self.persist().await;
        }
        Ok(())
    }

    /// Switch `bus` in or out of receive-only mode. Takes effect for the next
    /// `send_can`; the driver is not restarted.
    pub async fn set_listen_only(&self, bus: u8, listen_only: bool) -> Result<(), ConfigError> {
        let idx = self.configured_bus(bus)?;

        let changed = self.settings.update(|record| {
            let config = &mut record.bus_config[idx];
            let changed = config.listen_only != listen_only;
            config.listen_only = listen_only;
            changed
        });
        if changed {
            self.persist().await;
        }
        Ok(())
    }

    /// Persist a new bus count and reset the device so it takes effect.
    ///
    /// On success this never returns: the watchdog is armed and the caller is
    /// parked until the reset lands.
    pub async fn set_num_busses(&self, count: u8) -> Result<Infallible, ConfigError> {
        if count as usize > MAX_BUSSES {
            #[cfg(feature = "defmt")]
            defmt::error!("Invalid number of busses: {}", count);
            return Err(ConfigError::BusCountOutOfRange {
                count,
                max: MAX_BUSSES as u8,
            });
        }

        self.settings.update(|record| record.num_busses = count);
        self.persist().await;

        #[cfg(feature = "defmt")]
        defmt::warn!("CAN bus count set to {}, rebooting", count);

        self.with_board(|board| board.arm_watchdog_reset());
        Ok(core::future::pending::<Infallible>().await)
    }
}
