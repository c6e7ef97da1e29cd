//! Trapezoidal motion profile generator
//!
//! Integer-only implementation of the classic accelerate / cruise / brake
//! profile. The profile runs open loop: `advance` is called once per
//! control tick and updates a commanded position that a board layer turns
//! into step pulses.
//!
//! Velocity is kept in steps per second and integrated with a sub-step
//! accumulator, so speeds below one step per tick still move.

use axon_core::config::DEFAULT_SETTINGS;
use axon_core::traits::MotionActuator;
use axon_protocol::Settings;

/// Profile integration rate; `advance` is expected once per tick
pub const TICK_HZ: u32 = 1_000;

const TICK_STEPS: i32 = TICK_HZ as i32;

/// Active motion program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Program {
    /// Holding still
    Rest,
    /// Profiled move that settles on a target position
    ToTarget { target: i32 },
    /// Constant-velocity motion that never settles on its own
    Continuous { speed: i32 },
}

/// Motion profile state for one axis
///
/// Holds the committed settings the same way the chip drivers hold their
/// config structs; `top_speed` and `accel` are read from it live, so a
/// settings update re-plans the motion in flight.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProfileActuator {
    settings: Settings,
    program: Program,
    /// Commanded position in steps
    position: i32,
    /// Signed velocity in steps per second
    velocity: i32,
    /// Sub-step accumulator in 1/TICK_HZ steps
    fraction: i32,
    /// Sub-tick acceleration accumulator, keeps low accel values moving
    accel_frac: u32,
    current: u8,
    enabled: bool,
}

impl ProfileActuator {
    pub fn new() -> Self {
        Self {
            settings: DEFAULT_SETTINGS,
            program: Program::Rest,
            position: 0,
            velocity: 0,
            fraction: 0,
            accel_frac: 0,
            current: 0,
            enabled: false,
        }
    }

    /// Committed settings this profile plans against
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Signed velocity in steps per second
    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    /// Whether the power stage is energized
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Commanded current level
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Steps needed to brake from the current speed
    fn stopping_steps(&self) -> u32 {
        let v = self.velocity.unsigned_abs();
        let accel = (self.settings.accel as u32).max(1);
        (v * v) / (2 * accel)
    }

    /// Velocity the active program wants right now
    fn desired_velocity(&self) -> i32 {
        let top = self.settings.top_speed as i32;
        match self.program {
            Program::Rest => 0,
            Program::Continuous { speed } => speed.clamp(-top, top),
            Program::ToTarget { target } => {
                let remaining = target - self.position;
                if remaining == 0 {
                    0
                } else if remaining.unsigned_abs() <= self.stopping_steps() {
                    // Inside braking distance
                    0
                } else if remaining > 0 {
                    top
                } else {
                    -top
                }
            }
        }
    }

    /// Move velocity toward `desired`, limited by the configured
    /// acceleration
    fn slew_velocity(&mut self, desired: i32) {
        self.accel_frac += self.settings.accel as u32;
        let dv = (self.accel_frac / TICK_HZ) as i32;
        self.accel_frac %= TICK_HZ;

        if self.velocity < desired {
            self.velocity = (self.velocity + dv).min(desired);
        } else {
            self.velocity = (self.velocity - dv).max(desired);
        }
    }

    /// Integrate one tick of motion into the commanded position
    fn integrate(&mut self) {
        self.fraction += self.velocity;
        let mut steps = self.fraction / TICK_STEPS;
        self.fraction -= steps * TICK_STEPS;

        if let Program::ToTarget { target } = self.program {
            let remaining = target - self.position;
            // The final tick lands exactly on the target, never past it
            if steps.signum() == remaining.signum()
                && steps.unsigned_abs() >= remaining.unsigned_abs()
            {
                steps = remaining;
                self.velocity = 0;
                self.fraction = 0;
            }
        }

        self.position += steps;
    }
}

impl Default for ProfileActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionActuator for ProfileActuator {
    fn init(&mut self) {
        self.program = Program::Rest;
        self.position = 0;
        self.velocity = 0;
        self.fraction = 0;
        self.accel_frac = 0;
        self.current = 0;
        self.enabled = false;
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.settings = *settings;
    }

    fn enable_driver(&mut self) {
        self.enabled = true;
    }

    fn disable_driver(&mut self) {
        self.enabled = false;
        self.program = Program::Rest;
        self.velocity = 0;
        self.fraction = 0;
    }

    fn set_current(&mut self, level: u8) {
        self.current = level;
    }

    fn goto_position(&mut self, target: i32) {
        self.program = Program::ToTarget { target };
    }

    fn stop(&mut self) {
        let brake = self.stopping_steps().min(i32::MAX as u32) as i32;
        let target = if self.velocity >= 0 {
            self.position.saturating_add(brake)
        } else {
            self.position.saturating_sub(brake)
        };
        self.program = Program::ToTarget { target };
    }

    fn run_continuous(&mut self, speed: i32) {
        self.program = Program::Continuous { speed };
    }

    fn advance(&mut self) {
        if !self.enabled {
            return;
        }
        let desired = self.desired_velocity();
        self.slew_velocity(desired);
        self.integrate();
    }

    fn steps_remaining(&self) -> u32 {
        match self.program {
            Program::Rest => 0,
            Program::Continuous { .. } => u32::MAX,
            Program::ToTarget { target } => (target - self.position).unsigned_abs(),
        }
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn hard_reset_position(&mut self) {
        self.program = Program::Rest;
        self.position = 0;
        self.velocity = 0;
        self.fraction = 0;
        self.accel_frac = 0;
    }
}
