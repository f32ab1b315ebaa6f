//! Settings persistence: the in-memory [`SettingsRecord`] and the lock that
//! serialises writes to durable storage.
//!
//! Both the record and the storage lock are built by [`SettingsStore::new`],
//! before any task can call a configuration API. [`SettingsStore::load`] must
//! run once at startup, before the tasks using the controller are spawned.
pub mod record;

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;

use crate::core::{SETTINGS_BLOB_NAME, SETTINGS_LOCK_TIMEOUT_MS};
use crate::error::PersistError;
use crate::platform::bridge::BridgeHook;
use crate::platform::storage::SettingsStorage;
use crate::transport::traits::bus_timer::{with_timeout, BusTimer};

pub use record::{BusConfig, SettingsRecord, SETTINGS_RECORD_SIZE};

/// Owner of the live settings record and of the durable copy.
pub struct SettingsStore<S: SettingsStorage> {
    /// Live record. Short critical sections only, readable from any task.
    record: BlockingMutex<CriticalSectionRawMutex, Cell<SettingsRecord>>,
    /// Storage guard: one write in flight at a time.
    storage: Mutex<CriticalSectionRawMutex, S>,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Zero-valued record in front of `storage`.
    pub const fn new(storage: S) -> Self {
        Self {
            record: BlockingMutex::new(Cell::new(SettingsRecord::new())),
            storage: Mutex::new(storage),
        }
    }

    /// Copy of the live record.
    pub fn snapshot(&self) -> SettingsRecord {
        self.record.lock(|cell| cell.get())
    }

    /// Mutate the live record in place. Nothing is persisted.
    pub fn update<R>(&self, f: impl FnOnce(&mut SettingsRecord) -> R) -> R {
        self.record.lock(|cell| {
            let mut record = cell.get();
            let out = f(&mut record);
            cell.set(record);
            out
        })
    }

    /// Read the durable record and make it live.
    ///
    /// On failure the live record keeps its defaults. On success `bridge` is
    /// told which bus pair the restored settings link.
    pub async fn load<H: BridgeHook>(&self, bridge: &mut H) -> Result<SettingsRecord, PersistError> {
        let mut buf = [0u8; SETTINGS_RECORD_SIZE];
        let read = {
            let mut storage = self.storage.lock().await;
            storage.read(SETTINGS_BLOB_NAME, &mut buf).await
        };

        match read {
            Ok(len) if len == SETTINGS_RECORD_SIZE => {}
            Ok(len) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Failed to read CAN settings file: {} bytes", len);
                return Err(PersistError::ShortRead {
                    read: len,
                    expected: SETTINGS_RECORD_SIZE,
                });
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Failed to read CAN settings file");
                return Err(PersistError::Storage);
            }
        }

        let record = SettingsRecord::from_bytes(&buf);
        self.update(|live| *live = record);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Loaded CAN settings: {} bus(ses), bridge {}<->{}",
            record.num_busses,
            record.bridged[0],
            record.bridged[1]
        );

        let (bus_a, bus_b) = record.bridge();
        bridge.set_bridge(bus_a, bus_b);
        Ok(record)
    }

    /// Overwrite the durable copy with the live record.
    ///
    /// Gives up when the storage lock is not acquired within
    /// [`SETTINGS_LOCK_TIMEOUT_MS`]. The record is captured after the lock is
    /// taken, so the most recent state is the one written.
    pub async fn store<T: BusTimer>(&self, timer: &T) -> Result<(), PersistError> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Storing CAN settings...");

        let Some(mut storage) =
            with_timeout(timer, SETTINGS_LOCK_TIMEOUT_MS, self.storage.lock()).await
        else {
            #[cfg(feature = "defmt")]
            defmt::error!("Failed to take settings mutex for store_settings");
            return Err(PersistError::LockTimeout);
        };

        let bytes = self.snapshot().to_bytes();
        storage
            .write(SETTINGS_BLOB_NAME, &bytes)
            .await
            .map_err(|_err| {
                #[cfg(feature = "defmt")]
                defmt::error!("Failed to write CAN settings file");
                PersistError::Storage
            })
    }
}
