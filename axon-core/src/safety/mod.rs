//! Safety monitoring
//!
//! Polls sensor state every cycle and forces mode transitions that
//! override whatever the dispatcher just did.

pub mod monitor;

pub use monitor::{InterlockTrip, SafetyMonitor, SensorSnapshot, MAX_TRIPS_PER_SCAN};
