//! Motion actuator implementations

pub mod profile;

pub use profile::{ProfileActuator, TICK_HZ};
