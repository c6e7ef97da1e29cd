//! Events that trigger mode transitions

/// Events that can trigger mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Configuration outcomes (boot and Reset)
    /// Compiled-in defaults validated and committed
    ConfigAccepted,
    /// Compiled-in defaults failed validation
    ConfigRejected,

    // Host commands
    /// Goto accepted by the dispatcher
    MoveRequested,
    /// Stop accepted by the dispatcher
    StopRequested,
    /// Home accepted by the dispatcher
    HomeRequested,

    // Periodic outcomes
    /// Idle exceeded the sleep timeout
    IdleTimeout,
    /// Motion ran down to zero remaining steps
    TargetReached,

    // Safety monitor trips
    /// Home sensor triggered while homing
    HomeTripped,
    /// A limit switch triggered
    LimitTripped,
}

impl Event {
    /// Check if this event originates from a host command
    pub fn is_host_event(&self) -> bool {
        matches!(
            self,
            Event::MoveRequested | Event::StopRequested | Event::HomeRequested
        )
    }

    /// Check if this event originates from the safety monitor
    pub fn is_safety_event(&self) -> bool {
        matches!(self, Event::HomeTripped | Event::LimitTripped)
    }
}
