//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in axon-core for the controller's peripherals:
//!
//! - Motion profile actuator (trapezoidal, integer math)
//! - GPIO sensor bank and status LED pair
//! - Frame-queue transport for interrupt-driven links

#![no_std]
#![deny(unsafe_code)]

pub mod actuator;
pub mod indicator;
pub mod sensor;
pub mod transport;
