//! Sensor bank read directly from GPIO inputs
//!
//! Reports raw electrical levels; the polarity flags in the settings decide
//! what counts as tripped, so no inversion happens here.

use axon_core::traits::SensorInputs;
use embedded_hal::digital::InputPin;

/// Limit and home switches wired to three input pins
///
/// A failed pin read reports low.
pub struct PinSensors<L1, L2, H> {
    limit_1: L1,
    limit_2: L2,
    home: H,
}

impl<L1, L2, H> PinSensors<L1, L2, H> {
    pub fn new(limit_1: L1, limit_2: L2, home: H) -> Self {
        Self {
            limit_1,
            limit_2,
            home,
        }
    }

    /// Release the pins
    pub fn into_parts(self) -> (L1, L2, H) {
        (self.limit_1, self.limit_2, self.home)
    }
}

impl<L1, L2, H> SensorInputs for PinSensors<L1, L2, H>
where
    L1: InputPin,
    L2: InputPin,
    H: InputPin,
{
    fn limit_1(&mut self) -> bool {
        self.limit_1.is_high().unwrap_or(false)
    }

    fn limit_2(&mut self) -> bool {
        self.limit_2.is_high().unwrap_or(false)
    }

    fn home(&mut self) -> bool {
        self.home.is_high().unwrap_or(false)
    }
}
