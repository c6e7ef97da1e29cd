//! Status indicator implementations

pub mod pins;

pub use pins::{PinIndicator, PULSE_ON_LEVEL};
