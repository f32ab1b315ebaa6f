//! Error definitions shared across library modules.
//! Each type models one failure family: invalid configuration, frame
//! queueing, and settings persistence. Hardware transmit failures are logged
//! by the dispatcher and never surface as a value.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Requests addressing a bus or bus count the device does not support.
pub enum ConfigError {
    /// Bus index is beyond the compiled maximum or the configured bus count.
    #[error("Invalid CAN bus number: {bus}")]
    InvalidBus { bus: u8 },
    /// Requested bus count exceeds the compiled maximum.
    #[error("Invalid number of CAN buses: {count} (max {max})")]
    BusCountOutOfRange { count: u8, max: u8 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures of the frame send/receive API.
pub enum FrameError {
    /// Bus index rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The bus is currently disabled.
    #[error("CAN bus {bus} is not enabled")]
    NotEnabled { bus: u8 },
    /// The bus is receive-only, transmission is refused.
    #[error("CAN bus {bus} is in listen-only mode")]
    ListenOnly { bus: u8 },
    /// The transmit queue stayed full for the whole wait.
    #[error("CAN bus {bus}: TX queue full")]
    QueueFull { bus: u8 },
    /// No frame arrived before the wait expired.
    #[error("Timed out waiting for a frame")]
    Timeout,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while loading or storing the settings blob.
///
/// The in-memory record stays authoritative; these only mean the change is not
/// durable yet.
pub enum PersistError {
    /// Another settings write held the storage lock for the whole wait.
    #[error("Failed to take settings lock")]
    LockTimeout,
    /// The storage driver rejected the operation.
    #[error("Settings storage error")]
    Storage,
    /// The stored blob is shorter than the record layout.
    #[error("Settings blob too short -> read: {read}, expected: {expected}")]
    ShortRead { read: usize, expected: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raised when a bounded queue has no free slot.
#[error("Queue full")]
pub struct QueueFull;
