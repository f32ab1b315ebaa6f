//! `multibus-can` library: controller core for a board running up to three
//! software CAN buses in a `no_std` environment. The crate exposes the frame
//! representation and driver contracts, the per-bus frame queues, the bus
//! lifecycle and management API, the transmit dispatcher, and durable
//! settings persistence.
#![cfg_attr(not(test), no_std)]
//==================================================================================
/// Compile-time bus profile, queue sizes and timing constants.
pub mod core;
/// Configuration, frame and persistence errors.
pub mod error;
/// CAN frames as seen by the application and the driver, and the driver and
/// timer contracts.
pub mod transport;
/// Board collaborators: GPIO/interrupt/watchdog, settings storage, activity
/// indicator and the bridge hook.
pub mod platform;
/// Durable per-bus settings and their storage lock.
pub mod settings;
/// Multi-bus controller: queues, lifecycle, interrupt entry points, transmit
/// dispatcher.
pub mod controller;
//==================================================================================
pub use controller::{BusState, BusTopology, CanController, TxDispatcher};
pub use error::{ConfigError, FrameError, PersistError};
pub use transport::frame::Frame;
