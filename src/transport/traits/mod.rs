//! Abstraction traits used by the controller (CAN driver and timer).
pub mod bus_timer;
pub mod can_driver;
