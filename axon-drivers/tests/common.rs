//! Shared bench fixture for the end-to-end tests
//!
//! Wires a complete firmware stack out of the driver building blocks:
//! profile actuator, GPIO sensors and LEDs, and the frame-queue transport.
//! Tests talk to it the way a host and the wiring harness would: encoded
//! frames in, encoded frames out, pin levels toggled by hand.

// Each test target compiles its own copy and uses a different slice of
// the fixture
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use axon_core::control::Controller;
use axon_core::state::Mode;
use axon_drivers::actuator::ProfileActuator;
use axon_drivers::indicator::PinIndicator;
use axon_drivers::sensor::PinSensors;
use axon_drivers::transport::QueueTransport;
use axon_protocol::{Command, Reply, Settings};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Input pin with a handle the test keeps to drive the level
#[derive(Clone, Default)]
pub struct SharedInput(Rc<Cell<bool>>);

impl SharedInput {
    pub fn set(&self, high: bool) {
        self.0.set(high);
    }
}

impl ErrorType for SharedInput {
    type Error = core::convert::Infallible;
}

impl InputPin for SharedInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Output pin with a handle the test keeps to observe the level
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<Cell<bool>>);

impl SharedOutput {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for SharedOutput {
    type Error = core::convert::Infallible;
}

impl OutputPin for SharedOutput {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }
}

pub type Firmware = Controller<
    ProfileActuator,
    PinSensors<SharedInput, SharedInput, SharedInput>,
    PinIndicator<SharedOutput, SharedOutput>,
>;

/// Complete bench: the firmware plus handles to every external signal
pub struct Rig {
    pub firmware: Firmware,
    pub link: QueueTransport,
    pub limit_1: SharedInput,
    pub limit_2: SharedInput,
    pub home: SharedInput,
    pub run_led: SharedOutput,
    pub fault_led: SharedOutput,
    pub now_ms: u32,
}

impl Rig {
    /// Build and boot a rig with the compiled-in defaults
    pub fn boot() -> Self {
        Self::boot_with(axon_core::config::DEFAULT_SETTINGS)
    }

    /// Build and boot a rig with explicit defaults
    ///
    /// Sensors start low; with active-low polarities, raise them before
    /// the first tick.
    pub fn boot_with(defaults: Settings) -> Self {
        let limit_1 = SharedInput::default();
        let limit_2 = SharedInput::default();
        let home = SharedInput::default();
        let run_led = SharedOutput::default();
        let fault_led = SharedOutput::default();

        let mut firmware = Controller::with_defaults(
            ProfileActuator::new(),
            PinSensors::new(limit_1.clone(), limit_2.clone(), home.clone()),
            PinIndicator::new(run_led.clone(), fault_led.clone()),
            defaults,
        );
        assert!(firmware.boot(0), "boot rejected its own defaults");

        Self {
            firmware,
            link: QueueTransport::new(),
            limit_1,
            limit_2,
            home,
            run_led,
            fault_led,
            now_ms: 0,
        }
    }

    /// Put one encoded command on the wire
    pub fn send(&mut self, command: Command) {
        assert!(
            self.link.push_inbound(&command.encode()),
            "inbound queue rejected a frame"
        );
    }

    /// Run one 1 ms control tick
    pub fn tick(&mut self) {
        self.now_ms += 1;
        self.firmware.service(&mut self.link, self.now_ms);
    }

    /// Run `n` ticks
    pub fn run(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Tick until the firmware settles in Idle; returns the tick count
    pub fn run_until_idle(&mut self, max_ticks: u32) -> u32 {
        for tick in 0..max_ticks {
            if self.firmware.mode() == Mode::Idle {
                return tick;
            }
            self.tick();
        }
        panic!("firmware did not settle within {} ticks", max_ticks);
    }

    /// Drain and decode everything on the outbound wire
    pub fn drain_replies(&mut self) -> Vec<Reply> {
        let mut replies = Vec::new();
        while let Some(frame) = self.link.pop_outbound() {
            replies.push(Reply::parse(&frame).expect("malformed reply frame"));
        }
        replies
    }
}
