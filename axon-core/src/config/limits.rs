//! Device limits and compiled-in defaults
//!
//! `validate` is the single gate for committing a Settings record: boot,
//! Reset, and runtime updates all run the same predicate.

use axon_protocol::Settings;

/// Highest motor current level (5-bit current DAC)
pub const CURRENT_LEVEL_MAX: u8 = 31;
/// Microstep resolutions the driver supports
pub const MICROSTEP_MODES: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
/// Longest sleep timeout: one hour in device time units
pub const SLEEP_TIMEOUT_MAX: u16 = 36_000;
/// Device time unit for `sleep_timeout`, in milliseconds
pub const SLEEP_TIME_UNIT_MS: u32 = 100;
/// Highest top speed in steps per second
pub const TOP_SPEED_MAX: u16 = 20_000;
/// Highest acceleration in steps per second squared
pub const ACCEL_MAX: u16 = 50_000;

/// Compiled-in defaults, validated at boot and restored by Reset
///
/// Sensors are wired active high: a resting input reads low.
pub const DEFAULT_SETTINGS: Settings = Settings {
    run_current: 16,
    sleep_current: 4,
    microstep_res: 16,
    sleep_timeout: 600, // one minute
    top_speed: 4000,
    accel: 8000,
    enable_lim1: true,
    enable_lim2: true,
    enable_home: true,
    lim1_polarity: true,
    lim2_polarity: true,
    home_polarity: true,
};

/// Check every numeric field against the device limits
///
/// Pure: returns false on the first violation and mutates nothing. Flag
/// fields are domain-checked when decoding from the wire, so a `Settings`
/// value cannot hold an out-of-domain flag.
pub fn validate(candidate: &Settings) -> bool {
    if candidate.run_current > CURRENT_LEVEL_MAX {
        return false;
    }
    if candidate.sleep_current > CURRENT_LEVEL_MAX {
        return false;
    }
    if !MICROSTEP_MODES.contains(&candidate.microstep_res) {
        return false;
    }
    if candidate.sleep_timeout > SLEEP_TIMEOUT_MAX {
        return false;
    }
    if candidate.top_speed > TOP_SPEED_MAX {
        return false;
    }
    if candidate.accel > ACCEL_MAX {
        return false;
    }
    true
}
