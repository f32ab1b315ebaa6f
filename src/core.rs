//! Build-time configuration shared by every module: the bus-count profile,
//! queue sizing, timeouts, and the constants baked into the persisted layout.

//==================================================================================BUS_PROFILE
/// Number of CAN buses wired on the board, selected at build time through the
/// `busses-1` / `busses-2` / `busses-3` cargo features.
///
/// The profile sizes the topology table and the queue registry once; nothing
/// grows or shrinks at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusProfile {
    Single,
    Dual,
    Triple,
}

impl BusProfile {
    /// Number of buses compiled in for this profile.
    pub const fn bus_count(self) -> usize {
        match self {
            BusProfile::Single => 1,
            BusProfile::Dual => 2,
            BusProfile::Triple => 3,
        }
    }
}

#[cfg(feature = "busses-3")]
pub const BUS_PROFILE: BusProfile = BusProfile::Triple;
#[cfg(all(feature = "busses-2", not(feature = "busses-3")))]
pub const BUS_PROFILE: BusProfile = BusProfile::Dual;
#[cfg(not(any(feature = "busses-2", feature = "busses-3")))]
pub const BUS_PROFILE: BusProfile = BusProfile::Single;

/// Compiled maximum number of buses.
pub const MAX_BUSSES: usize = BUS_PROFILE.bus_count();

/// Number of bus slots in the persisted settings record, independent of the
/// build profile so the blob layout never changes.
pub const STORED_BUS_SLOTS: usize = 3;

const _: () = assert!(MAX_BUSSES <= STORED_BUS_SLOTS);

/// Number of peripheral engines (PIO blocks) an interrupt can originate from.
pub const MAX_ENGINES: usize = 3;

//==================================================================================QUEUES
/// Capacity of every receive and transmit queue.
pub const CAN_QUEUE_SIZE: usize = 32;

/// Longest time `send_can` waits for room in a transmit queue (ms).
pub const CAN_QUEUE_TIMEOUT_MS: u32 = 50;

/// Bounded idle wait of the transmit dispatcher between two empty passes (ms).
pub const TX_IDLE_WAIT_MS: u32 = 10;

//==================================================================================SETTINGS
/// Longest time a settings write waits for the storage lock (ms).
pub const SETTINGS_LOCK_TIMEOUT_MS: u32 = 100;

/// Name of the durable settings blob.
pub const SETTINGS_BLOB_NAME: &str = "can_settings";

/// Bitrate reported for an unknown bus (bit/s).
pub const DEFAULT_BUS_SPEED: u32 = 500_000;

//==================================================================================INTERRUPTS
/// Priority given to every bus interrupt. Sits one level above the ceiling
/// used by scheduler primitives called from task code.
pub const CAN_IRQ_PRIORITY: u8 = 0x20 + 1;

/// Core that services every bus interrupt.
pub const CAN_IRQ_CORE: u8 = 1;
