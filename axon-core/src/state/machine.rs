//! Operating mode state machine
//!
//! All motor and indicator behavior is a function of the current mode and
//! an event. The transition function here is pure; entry and periodic
//! actions are applied by the controller.

use super::events::Event;

/// Operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Driver energized, axis at rest, awaiting commands
    Idle,
    /// Low-current rest after the idle timeout expired
    Sleep,
    /// Profiled motion toward an absolute target
    Moving,
    /// Continuous motion seeking the home sensor
    Homing,
    /// Latched fault; driver de-energized until a successful reset
    Fault,
}

impl Mode {
    /// Check if motion commands are accepted in this mode
    pub fn permits_motion(&self) -> bool {
        !self.is_fault()
    }

    /// Check if this is the latched fault mode
    pub fn is_fault(&self) -> bool {
        matches!(self, Mode::Fault)
    }

    /// Process an event and return the next mode
    ///
    /// This is the core transition logic; match arms earlier in the list
    /// take priority.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Mode::*;

        match (self, event) {
            // Reset/boot outcomes apply from any mode
            (_, ConfigAccepted) => Idle,
            (_, ConfigRejected) => Fault,

            // Limit interlocks fault from any mode, Idle included
            (_, LimitTripped) => Fault,

            // Fault latches against everything else until a reset
            (Fault, _) => Fault,

            // Host motion commands
            (_, MoveRequested) => Moving,
            (_, StopRequested) => Moving,
            (_, HomeRequested) => Homing,

            // Periodic and safety outcomes
            (Idle, IdleTimeout) => Sleep,
            (Moving, TargetReached) => Idle,
            (Homing, HomeTripped) => Idle,

            // Default: stay in current mode
            _ => self,
        }
    }
}
