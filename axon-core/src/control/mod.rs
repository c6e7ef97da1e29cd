//! Control loop tying the state machine, safety scan, and command
//! dispatch together

mod controller;

pub use controller::{
    sleep_pulse_level, Controller, MAX_REPLIES_PER_CYCLE, SLEEP_PULSE_PERIOD_MS,
};
