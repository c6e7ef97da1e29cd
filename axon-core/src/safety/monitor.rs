//! Safety interlock scanning
//!
//! Latches raw sensor levels once per cycle and evaluates the interlock
//! rules in a fixed order against the pre-scan mode.

use crate::state::Mode;
use axon_protocol::Settings;
use heapless::Vec;

/// Most trips a single scan can produce
pub const MAX_TRIPS_PER_SCAN: usize = 3;

/// Raw sensor levels latched at the top of a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    /// Limit switch 1 logic level
    pub limit_1: bool,
    /// Limit switch 2 logic level
    pub limit_2: bool,
    /// Home sensor logic level
    pub home: bool,
}

/// Interlock rules that can trip during a scan, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterlockTrip {
    /// Home sensor triggered while homing: successful completion
    HomeReached,
    /// Limit switch 1 triggered
    Limit1,
    /// Limit switch 2 triggered
    Limit2,
}

/// Per-cycle sensor interlock scanner
///
/// The monitor only evaluates latched levels; the controller executes the
/// side effects for each returned trip.
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    latched: SensorSnapshot,
}

impl SafetyMonitor {
    /// Create a monitor with all levels low
    pub fn new() -> Self {
        Self {
            latched: SensorSnapshot::default(),
        }
    }

    /// Latch fresh sensor levels for this cycle
    pub fn update(&mut self, snapshot: SensorSnapshot) {
        self.latched = snapshot;
    }

    /// Last latched levels
    pub fn latched(&self) -> SensorSnapshot {
        self.latched
    }

    /// Evaluate the interlock rules against the pre-scan mode
    ///
    /// Order is fixed: home completion first (meaningful only while
    /// Homing), then limit 1, then limit 2. Limits are checked in every
    /// mode so that externally forced motion trips them even while the
    /// axis is at rest. Every rule sees the same latched levels and the
    /// mode as it was when the scan began.
    pub fn scan(&self, settings: &Settings, mode: Mode) -> Vec<InterlockTrip, MAX_TRIPS_PER_SCAN> {
        let mut trips = Vec::new();

        if mode == Mode::Homing
            && settings.enable_home
            && triggered(self.latched.home, settings.home_polarity)
        {
            let _ = trips.push(InterlockTrip::HomeReached);
        }

        if settings.enable_lim1 && triggered(self.latched.limit_1, settings.lim1_polarity) {
            let _ = trips.push(InterlockTrip::Limit1);
        }

        if settings.enable_lim2 && triggered(self.latched.limit_2, settings.lim2_polarity) {
            let _ = trips.push(InterlockTrip::Limit2);
        }

        trips
    }
}

/// A sensor is triggered when its level matches the configured polarity
fn triggered(level: bool, active_high: bool) -> bool {
    level == active_high
}
