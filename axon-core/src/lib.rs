//! Board-agnostic core logic for the axis controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (actuator, sensors, indicator, transport)
//! - Operating-mode state machine
//! - Safety interlock scanning
//! - Control loop and command dispatch
//! - Settings validation and compiled-in defaults

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod safety;
pub mod state;
pub mod traits;
