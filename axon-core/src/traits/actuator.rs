//! Motion actuator trait
//!
//! Abstracts the device that turns motion requests into physical steps
//! (pulse generation, direction control, current control). The controller
//! drives the axis exclusively through this contract, which keeps the core
//! host-testable against a software implementation.

use axon_protocol::Settings;

/// Trait for the axis motion device
///
/// Positions are absolute signed step counts owned by the actuator; the
/// controller only observes and relays them.
pub trait MotionActuator {
    /// One-time hardware initialization; re-run on every Reset
    fn init(&mut self);

    /// Propagate committed settings (speed, acceleration, microstepping)
    fn apply_settings(&mut self, settings: &Settings);

    /// Energize the driver stage so the axis holds position
    fn enable_driver(&mut self);

    /// De-energize the driver stage; the axis is free to rotate
    fn disable_driver(&mut self);

    /// Set the motor current level in current-DAC units
    fn set_current(&mut self, level: u8);

    /// Begin a profiled move to an absolute step position
    fn goto_position(&mut self, target: i32);

    /// Begin decelerating to a halt
    ///
    /// Completion is observed through `steps_remaining`, not signalled.
    fn stop(&mut self);

    /// Run continuously at a signed speed in steps per second
    fn run_continuous(&mut self, speed: i32);

    /// Advance the motion program by one tick, stepping if due
    fn advance(&mut self);

    /// Steps left before the current motion program completes
    ///
    /// Zero when at rest; continuous motion never reports zero.
    fn steps_remaining(&self) -> u32;

    /// Current absolute position in steps
    fn current_position(&self) -> i32;

    /// Hard stop: drop motion instantly and zero position and target,
    /// bypassing deceleration
    fn hard_reset_position(&mut self);
}
