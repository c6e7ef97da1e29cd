//! Hardware abstraction traits
//!
//! The controller depends only on these contracts; device crates provide
//! the implementations.

pub mod actuator;
pub mod indicator;
pub mod sensors;
pub mod transport;

pub use actuator::MotionActuator;
pub use indicator::{Indicator, StatusPattern};
pub use sensors::SensorInputs;
pub use transport::{CommandFrame, Transport};
