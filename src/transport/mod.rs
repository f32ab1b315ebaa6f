//! Frame transport between the application and the low-level CAN engine:
//! the canonical [`Frame`](frame::Frame), its raw driver representation, and
//! the traits the controller drives (CAN driver, timer).

pub mod frame;
pub mod traits;
