//! Status indicator trait

/// Steady indicator patterns, one per externally visible condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusPattern {
    /// Axis idle and ready for commands
    Ready,
    /// Profiled motion in progress
    Active,
    /// Homing in progress
    Seeking,
    /// Latched fault
    Fault,
}

/// Trait for the status indicator
///
/// The board exposes two indicator channels; implementations map patterns
/// and pulse levels onto them however the hardware allows.
pub trait Indicator {
    /// Show a steady pattern
    fn show(&mut self, pattern: StatusPattern);

    /// Drive the sleep animation with a brightness level
    fn set_pulse(&mut self, level: u8);
}
