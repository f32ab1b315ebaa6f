//! Firmware collaborators outside the CAN engine: board hardware, activity
//! indicator, durable storage and the bridge activation hook.
pub mod board;
pub mod bridge;
pub mod storage;
