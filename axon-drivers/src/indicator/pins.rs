//! Status indicator driven by two GPIO LEDs
//!
//! A two-LED board cannot render every pattern distinctly, so the mapping
//! collapses to what the hardware can show: the run LED for normal
//! operation, the fault LED for trouble, both while seeking home.

use axon_core::traits::{Indicator, StatusPattern};
use embedded_hal::digital::OutputPin;

/// Pulse level at or above which the run LED is lit during sleep
pub const PULSE_ON_LEVEL: u8 = 128;

/// Run/fault LED pair
///
/// Write failures are ignored; an indicator must never stall the control
/// loop.
pub struct PinIndicator<R, F> {
    run: R,
    fault: F,
}

impl<R, F> PinIndicator<R, F>
where
    R: OutputPin,
    F: OutputPin,
{
    pub fn new(run: R, fault: F) -> Self {
        let mut indicator = Self { run, fault };
        indicator.set(false, false);
        indicator
    }

    fn set(&mut self, run: bool, fault: bool) {
        let _ = if run {
            self.run.set_high()
        } else {
            self.run.set_low()
        };
        let _ = if fault {
            self.fault.set_high()
        } else {
            self.fault.set_low()
        };
    }
}

impl<R, F> Indicator for PinIndicator<R, F>
where
    R: OutputPin,
    F: OutputPin,
{
    fn show(&mut self, pattern: StatusPattern) {
        let (run, fault) = match pattern {
            StatusPattern::Ready => (true, false),
            StatusPattern::Active => (true, false),
            StatusPattern::Seeking => (true, true),
            StatusPattern::Fault => (false, true),
        };
        self.set(run, fault);
    }

    fn set_pulse(&mut self, level: u8) {
        // Square-wave approximation of the brightness ramp
        let lit = level >= PULSE_ON_LEVEL;
        let _ = if lit {
            self.run.set_high()
        } else {
            self.run.set_low()
        };
    }
}
