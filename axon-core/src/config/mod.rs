//! Configuration validation and defaults
//!
//! The committed Settings record itself lives in the controller; this
//! module owns the device limits it is validated against.

pub mod limits;

pub use limits::{
    validate, ACCEL_MAX, CURRENT_LEVEL_MAX, DEFAULT_SETTINGS, MICROSTEP_MODES, SLEEP_TIMEOUT_MAX,
    SLEEP_TIME_UNIT_MS, TOP_SPEED_MAX,
};
