//! Sensor input implementations

pub mod pins;

pub use pins::PinSensors;
