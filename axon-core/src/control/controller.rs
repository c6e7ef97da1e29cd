//! Main controller coordinating dispatch, safety interlocks, and per-mode
//! behavior
//!
//! The controller is the single owner of the axis state. Each cycle:
//! - dispatches at most one inbound command frame
//! - latches the sensors and runs the safety scan, which can override
//!   whatever the dispatcher just did
//! - runs the active mode's periodic action
//!
//! All replies produced by a cycle are queued and handed to the transport
//! at the end of the cycle.

use axon_protocol::{Command, FaultCode, QueryKind, Reply, Settings, MODEL_ID, SERIAL_ID};
use heapless::Vec;

use crate::config::{self, SLEEP_TIME_UNIT_MS};
use crate::safety::{InterlockTrip, SafetyMonitor, SensorSnapshot};
use crate::state::{Event, Mode};
use crate::traits::{Indicator, MotionActuator, SensorInputs, StatusPattern, Transport};

/// Reply queue capacity; a cycle produces at most one dispatch reply,
/// three safety trips, and one completion, with headroom on top
pub const MAX_REPLIES_PER_CYCLE: usize = 8;

/// Full period of the sleep indicator animation, in milliseconds
pub const SLEEP_PULSE_PERIOD_MS: u32 = 2048;

/// Triangle brightness ramp for the sleep indicator animation
///
/// Rises 0..=255 over the first half of the period and falls back over
/// the second half.
pub fn sleep_pulse_level(elapsed_ms: u32) -> u8 {
    let phase = elapsed_ms % SLEEP_PULSE_PERIOD_MS;
    let half = SLEEP_PULSE_PERIOD_MS / 2;
    if phase < half {
        (phase / 4) as u8
    } else {
        ((SLEEP_PULSE_PERIOD_MS - 1 - phase) / 4) as u8
    }
}

/// Central controller; one instance owns the whole axis
///
/// Single-threaded and run-to-completion: no operation blocks, and time
/// enters only through the `now_ms` arguments. Elapsed time uses wrapping
/// arithmetic so the millisecond counter may roll over freely.
pub struct Controller<A, S, I> {
    /// Current operating mode
    mode: Mode,
    /// Committed settings; only records passing `validate` land here
    settings: Settings,
    /// Compiled-in defaults used at boot and restored by Reset
    defaults: Settings,
    /// Timestamp of the last mode change (ms)
    mode_entered_ms: u32,
    /// Last position observed from the actuator
    last_position: i32,
    /// Sensor interlock scanner
    monitor: SafetyMonitor,
    /// Replies produced by the current cycle
    replies: Vec<Reply, MAX_REPLIES_PER_CYCLE>,
    /// Motion device
    actuator: A,
    /// Limit and home inputs
    sensors: S,
    /// Status indicator
    indicator: I,
}

impl<A, S, I> Controller<A, S, I>
where
    A: MotionActuator,
    S: SensorInputs,
    I: Indicator,
{
    /// Create a controller with the compiled-in defaults
    ///
    /// Call `boot` before the first cycle; until then the controller sits
    /// in Fault and touches no hardware.
    pub fn new(actuator: A, sensors: S, indicator: I) -> Self {
        Self::with_defaults(actuator, sensors, indicator, config::DEFAULT_SETTINGS)
    }

    /// Create a controller with explicit boot defaults
    pub fn with_defaults(actuator: A, sensors: S, indicator: I, defaults: Settings) -> Self {
        Self {
            mode: Mode::Fault,
            settings: defaults,
            defaults,
            mode_entered_ms: 0,
            last_position: 0,
            monitor: SafetyMonitor::new(),
            replies: Vec::new(),
            actuator,
            sensors,
            indicator,
        }
    }

    /// Run the boot sequence: initialize the actuator, then validate and
    /// commit the defaults
    ///
    /// Returns true when boot reached Idle. On validation failure the
    /// controller enters Fault, queues a fault reply, and accepts nothing
    /// but Reset, Query, UpdateParameters, and Echo until a later Reset
    /// succeeds.
    pub fn boot(&mut self, now_ms: u32) -> bool {
        self.replies.clear();
        self.reinitialize(now_ms)
    }

    /// Run one full control cycle
    ///
    /// Order is fixed: dispatch the inbound frame if present, scan the
    /// safety interlocks, then run the active mode's periodic action.
    /// Replies produced by the cycle are available from `replies` until
    /// the next cycle begins.
    pub fn cycle(&mut self, inbound: Option<&[u8]>, now_ms: u32) {
        self.replies.clear();

        if let Some(frame) = inbound {
            self.dispatch(frame, now_ms);
        }

        self.run_safety(now_ms);
        self.run_periodic(now_ms);

        self.last_position = self.actuator.current_position();
    }

    /// Pull one frame from the transport, run a cycle, and send every
    /// queued reply
    pub fn service<T: Transport>(&mut self, link: &mut T, now_ms: u32) {
        let frame = link.poll_frame();
        self.cycle(frame.as_deref(), now_ms);

        for reply in &self.replies {
            link.send(&reply.encode());
        }
    }

    /// Current operating mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Committed settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Last position observed from the actuator
    pub fn position(&self) -> i32 {
        self.last_position
    }

    /// Replies produced by the most recent cycle
    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    /// Access the motion device
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Access the indicator device
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Decode a frame and route it to its handler
    fn dispatch(&mut self, frame: &[u8], now_ms: u32) {
        match Command::parse(frame) {
            Ok(command) => self.handle_command(command, now_ms),
            Err(err) => self.push_fault(err.fault_code()),
        }
    }

    fn handle_command(&mut self, command: Command, now_ms: u32) {
        match command {
            Command::Goto(target) => self.handle_goto(target, now_ms),
            Command::Stop => self.handle_stop(now_ms),
            Command::Home { forward } => self.handle_home(forward, now_ms),
            Command::Reset => self.handle_reset(now_ms),
            Command::Query(kind) => self.handle_query(kind),
            Command::UpdateParameters(candidate) => self.handle_update(candidate),
            Command::Echo => self.push_ack(&[]),
        }
    }

    /// Goto: always accepted outside Fault; the target needs no range
    /// check beyond decoding
    fn handle_goto(&mut self, target: i32, now_ms: u32) {
        if !self.mode.permits_motion() {
            self.push_fault(FaultCode::NotAcknowledged);
            return;
        }

        self.actuator.goto_position(target);
        self.push_ack(&target.to_le_bytes());
        self.apply_event(Event::MoveRequested, now_ms);
    }

    fn handle_stop(&mut self, now_ms: u32) {
        if !self.mode.permits_motion() {
            self.push_fault(FaultCode::NotAcknowledged);
            return;
        }

        self.actuator.stop();
        self.push_ack(&[]);
        // Lands in Moving, not Idle: the periodic check observes the halt
        // and settles with a completion reply.
        self.apply_event(Event::StopRequested, now_ms);
    }

    fn handle_home(&mut self, forward: bool, now_ms: u32) {
        if !self.mode.permits_motion() {
            self.push_fault(FaultCode::NotAcknowledged);
            return;
        }
        if !self.settings.enable_home {
            self.push_fault(FaultCode::HomeDisabled);
            return;
        }

        let speed = self.settings.top_speed as i32;
        let speed = if forward { speed } else { -speed };
        self.actuator.run_continuous(speed);
        self.push_ack(&[forward as u8]);
        self.apply_event(Event::HomeRequested, now_ms);
    }

    fn handle_reset(&mut self, now_ms: u32) {
        if self.reinitialize(now_ms) {
            self.push_ack(&[]);
        }
    }

    fn handle_query(&mut self, kind: QueryKind) {
        match kind {
            QueryKind::Model => self.push_ack(&MODEL_ID.to_le_bytes()),
            QueryKind::Serial => self.push_ack(&SERIAL_ID.to_le_bytes()),
            QueryKind::Parameters => {
                let raw = self.settings.to_bytes();
                self.push_ack(&raw);
            }
        }
    }

    /// UpdateParameters is all-or-nothing: the committed record changes
    /// only after the candidate passes the same predicate boot uses
    fn handle_update(&mut self, candidate: Settings) {
        if !config::validate(&candidate) {
            self.push_fault(FaultCode::InvalidParameters);
            return;
        }

        self.settings = candidate;
        self.actuator.apply_settings(&self.settings);
        self.push_ack(&[]);
    }

    /// Shared boot/Reset path: re-init the hardware, re-validate the
    /// defaults, and commit them
    fn reinitialize(&mut self, now_ms: u32) -> bool {
        self.actuator.init();

        let accepted = config::validate(&self.defaults);
        let event = if accepted {
            self.settings = self.defaults;
            self.actuator.apply_settings(&self.settings);
            Event::ConfigAccepted
        } else {
            self.push_fault(FaultCode::InvalidParameters);
            Event::ConfigRejected
        };

        // Entry actions rerun even when the mode is unchanged; `init` has
        // just reset the driver state.
        let next = self.mode.transition(event);
        self.enter_mode(next, now_ms);
        accepted
    }

    /// Latch the sensors and execute every tripped interlock in order
    ///
    /// The scan is evaluated against the pre-scan mode; when several rules
    /// trip at once each still runs its side effects, and the last one
    /// decides the final mode.
    fn run_safety(&mut self, now_ms: u32) {
        let snapshot = SensorSnapshot {
            limit_1: self.sensors.limit_1(),
            limit_2: self.sensors.limit_2(),
            home: self.sensors.home(),
        };
        self.monitor.update(snapshot);

        let trips = self.monitor.scan(&self.settings, self.mode);
        for trip in trips {
            match trip {
                InterlockTrip::HomeReached => {
                    self.actuator.hard_reset_position();
                    self.apply_event(Event::HomeTripped, now_ms);
                    let position = self.actuator.current_position();
                    self.push_done(&position.to_le_bytes());
                }
                InterlockTrip::Limit1 => {
                    self.actuator.hard_reset_position();
                    self.apply_event(Event::LimitTripped, now_ms);
                    self.push_fault(FaultCode::Limit1Tripped);
                }
                InterlockTrip::Limit2 => {
                    self.actuator.hard_reset_position();
                    self.apply_event(Event::LimitTripped, now_ms);
                    self.push_fault(FaultCode::Limit2Tripped);
                }
            }
        }
    }

    /// Run the active mode's periodic action
    fn run_periodic(&mut self, now_ms: u32) {
        match self.mode {
            Mode::Idle => {
                let timeout_ms = self.settings.sleep_timeout as u32 * SLEEP_TIME_UNIT_MS;
                if self.mode_elapsed_ms(now_ms) > timeout_ms {
                    self.apply_event(Event::IdleTimeout, now_ms);
                }
            }
            Mode::Sleep => {
                let level = sleep_pulse_level(self.mode_elapsed_ms(now_ms));
                self.indicator.set_pulse(level);
            }
            Mode::Moving => {
                if self.actuator.steps_remaining() == 0 {
                    self.apply_event(Event::TargetReached, now_ms);
                    let position = self.actuator.current_position();
                    self.push_done(&position.to_le_bytes());
                } else {
                    self.actuator.advance();
                }
            }
            Mode::Homing => self.actuator.advance(),
            Mode::Fault => {}
        }
    }

    /// Run an event through the transition function, applying entry
    /// actions when the mode changes
    fn apply_event(&mut self, event: Event, now_ms: u32) {
        let next = self.mode.transition(event);
        if next != self.mode {
            self.enter_mode(next, now_ms);
        }
    }

    /// Commit a mode change and run its entry actions
    fn enter_mode(&mut self, mode: Mode, now_ms: u32) {
        self.mode = mode;
        self.mode_entered_ms = now_ms;

        match mode {
            Mode::Idle => {
                self.actuator.enable_driver();
                self.indicator.show(StatusPattern::Ready);
            }
            Mode::Sleep => {
                self.actuator.set_current(self.settings.sleep_current);
            }
            Mode::Moving => {
                self.actuator.set_current(self.settings.run_current);
                self.indicator.show(StatusPattern::Active);
            }
            Mode::Homing => {
                self.actuator.set_current(self.settings.run_current);
                self.indicator.show(StatusPattern::Seeking);
            }
            Mode::Fault => {
                self.actuator.disable_driver();
                self.indicator.show(StatusPattern::Fault);
            }
        }
    }

    fn mode_elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.mode_entered_ms)
    }

    fn push_ack(&mut self, payload: &[u8]) {
        let _ = self.replies.push(Reply::ack(payload));
    }

    fn push_done(&mut self, payload: &[u8]) {
        let _ = self.replies.push(Reply::done(payload));
    }

    fn push_fault(&mut self, code: FaultCode) {
        let _ = self.replies.push(Reply::Fault(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SETTINGS;
    use crate::traits::CommandFrame;
    use core::cell::Cell;
    use heapless::Deque;

    #[derive(Debug, Default)]
    struct MockActuator {
        position: i32,
        target: i32,
        continuous: bool,
        speed: i32,
        enabled: bool,
        current: u8,
        inits: u8,
        applies: u8,
        hard_stops: u8,
    }

    impl MotionActuator for MockActuator {
        fn init(&mut self) {
            self.inits += 1;
        }

        fn apply_settings(&mut self, _settings: &Settings) {
            self.applies += 1;
        }

        fn enable_driver(&mut self) {
            self.enabled = true;
        }

        fn disable_driver(&mut self) {
            self.enabled = false;
        }

        fn set_current(&mut self, level: u8) {
            self.current = level;
        }

        fn goto_position(&mut self, target: i32) {
            self.target = target;
            self.continuous = false;
        }

        fn stop(&mut self) {
            self.target = self.position;
            self.continuous = false;
        }

        fn run_continuous(&mut self, speed: i32) {
            self.continuous = true;
            self.speed = speed;
        }

        fn advance(&mut self) {
            if self.continuous {
                self.position += self.speed.signum();
            } else if self.position != self.target {
                self.position += (self.target - self.position).signum();
            }
        }

        fn steps_remaining(&self) -> u32 {
            if self.continuous {
                1
            } else {
                (self.target - self.position).unsigned_abs()
            }
        }

        fn current_position(&self) -> i32 {
            self.position
        }

        fn hard_reset_position(&mut self) {
            self.position = 0;
            self.target = 0;
            self.continuous = false;
            self.speed = 0;
            self.hard_stops += 1;
        }
    }

    struct MockSensors<'a> {
        limit_1: &'a Cell<bool>,
        limit_2: &'a Cell<bool>,
        home: &'a Cell<bool>,
    }

    impl SensorInputs for MockSensors<'_> {
        fn limit_1(&mut self) -> bool {
            self.limit_1.get()
        }

        fn limit_2(&mut self) -> bool {
            self.limit_2.get()
        }

        fn home(&mut self) -> bool {
            self.home.get()
        }
    }

    #[derive(Debug, Default)]
    struct MockIndicator {
        pattern: Option<StatusPattern>,
        last_pulse: u8,
        pulses: u32,
    }

    impl Indicator for MockIndicator {
        fn show(&mut self, pattern: StatusPattern) {
            self.pattern = Some(pattern);
        }

        fn set_pulse(&mut self, level: u8) {
            self.last_pulse = level;
            self.pulses += 1;
        }
    }

    type Ctrl<'a> = Controller<MockActuator, MockSensors<'a>, MockIndicator>;

    struct Pins {
        limit_1: Cell<bool>,
        limit_2: Cell<bool>,
        home: Cell<bool>,
    }

    impl Pins {
        fn new() -> Self {
            Self {
                limit_1: Cell::new(false),
                limit_2: Cell::new(false),
                home: Cell::new(false),
            }
        }

        fn controller(&self) -> Ctrl<'_> {
            self.controller_with(DEFAULT_SETTINGS)
        }

        fn controller_with(&self, defaults: Settings) -> Ctrl<'_> {
            Controller::with_defaults(
                MockActuator::default(),
                MockSensors {
                    limit_1: &self.limit_1,
                    limit_2: &self.limit_2,
                    home: &self.home,
                },
                MockIndicator::default(),
                defaults,
            )
        }
    }

    fn send(ctrl: &mut Ctrl<'_>, command: Command, now_ms: u32) {
        let frame = command.encode();
        ctrl.cycle(Some(&frame), now_ms);
    }

    #[test]
    fn test_boot_enters_idle() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();

        assert!(ctrl.boot(0));
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert!(ctrl.replies().is_empty());
        assert_eq!(ctrl.actuator().inits, 1);
        assert_eq!(ctrl.actuator().applies, 1);
        assert!(ctrl.actuator().enabled);
        assert_eq!(ctrl.indicator().pattern, Some(StatusPattern::Ready));
    }

    #[test]
    fn test_boot_with_invalid_defaults_faults() {
        let pins = Pins::new();
        let bad = Settings {
            run_current: 40,
            ..DEFAULT_SETTINGS
        };
        let mut ctrl = pins.controller_with(bad);

        assert!(!ctrl.boot(0));
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::InvalidParameters)]
        );
        assert!(!ctrl.actuator().enabled);
        assert_eq!(ctrl.indicator().pattern, Some(StatusPattern::Fault));
    }

    #[test]
    fn test_echo_liveness() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Echo, 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&[])]);
        assert_eq!(ctrl.mode(), Mode::Idle);
    }

    #[test]
    fn test_goto_moves_to_target_and_completes() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Goto(3), 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&3i32.to_le_bytes())]);
        assert_eq!(ctrl.mode(), Mode::Moving);
        assert_eq!(ctrl.actuator().current, DEFAULT_SETTINGS.run_current);
        assert_eq!(ctrl.indicator().pattern, Some(StatusPattern::Active));

        // One step per cycle until the target is reached
        ctrl.cycle(None, 20);
        ctrl.cycle(None, 30);
        assert_eq!(ctrl.mode(), Mode::Moving);
        assert_eq!(ctrl.position(), 3);

        ctrl.cycle(None, 40);
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert_eq!(ctrl.replies(), &[Reply::done(&3i32.to_le_bytes())]);
    }

    #[test]
    fn test_goto_already_at_target_completes_same_cycle() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Goto(0), 10);
        assert_eq!(
            ctrl.replies(),
            &[
                Reply::ack(&0i32.to_le_bytes()),
                Reply::done(&0i32.to_le_bytes()),
            ]
        );
        assert_eq!(ctrl.mode(), Mode::Idle);
    }

    #[test]
    fn test_stop_settles_through_moving() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Stop, 10);
        assert_eq!(ctrl.mode(), Mode::Idle); // settled within the same cycle
        assert_eq!(
            ctrl.replies(),
            &[Reply::ack(&[]), Reply::done(&0i32.to_le_bytes())]
        );
    }

    #[test]
    fn test_stop_interrupts_motion() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Goto(100), 10);
        ctrl.cycle(None, 20);
        ctrl.cycle(None, 30);
        assert_eq!(ctrl.mode(), Mode::Moving);

        send(&mut ctrl, Command::Stop, 40);
        assert_eq!(ctrl.mode(), Mode::Idle);
        let position = ctrl.position();
        assert!(position > 0 && position < 100);
        assert_eq!(
            ctrl.replies(),
            &[Reply::ack(&[]), Reply::done(&position.to_le_bytes())]
        );
    }

    #[test]
    fn test_home_flow_completes_on_sensor() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Home { forward: true }, 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&[1])]);
        assert_eq!(ctrl.mode(), Mode::Homing);
        assert_eq!(ctrl.indicator().pattern, Some(StatusPattern::Seeking));
        assert_eq!(
            ctrl.actuator().speed,
            DEFAULT_SETTINGS.top_speed as i32
        );

        // Seeking: continuous motion advances every cycle
        ctrl.cycle(None, 20);
        ctrl.cycle(None, 30);
        assert!(ctrl.position() > 0);

        // Sensor trips: hard stop, position zeroed, Done with the result
        pins.home.set(true);
        ctrl.cycle(None, 40);
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert_eq!(ctrl.position(), 0);
        assert_eq!(ctrl.actuator().hard_stops, 1);
        assert_eq!(ctrl.replies(), &[Reply::done(&0i32.to_le_bytes())]);
    }

    #[test]
    fn test_home_reverse_negates_speed() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Home { forward: false }, 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&[0])]);
        assert_eq!(
            ctrl.actuator().speed,
            -(DEFAULT_SETTINGS.top_speed as i32)
        );
    }

    #[test]
    fn test_home_disabled_rejected() {
        let pins = Pins::new();
        let defaults = Settings {
            enable_home: false,
            ..DEFAULT_SETTINGS
        };
        let mut ctrl = pins.controller_with(defaults);
        ctrl.boot(0);

        send(&mut ctrl, Command::Home { forward: true }, 10);
        assert_eq!(ctrl.replies(), &[Reply::Fault(FaultCode::HomeDisabled)]);
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert!(!ctrl.actuator().continuous);
    }

    #[test]
    fn test_limit_trip_faults_from_idle() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        pins.limit_1.set(true);
        ctrl.cycle(None, 10);
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(ctrl.replies(), &[Reply::Fault(FaultCode::Limit1Tripped)]);
        assert_eq!(ctrl.actuator().hard_stops, 1);
        assert!(!ctrl.actuator().enabled);
        assert_eq!(ctrl.indicator().pattern, Some(StatusPattern::Fault));
    }

    #[test]
    fn test_limit_trip_overrides_fresh_command() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        // The dispatcher accepts the move, then the safety scan overrides it
        pins.limit_2.set(true);
        send(&mut ctrl, Command::Goto(500), 10);
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(
            ctrl.replies(),
            &[
                Reply::ack(&500i32.to_le_bytes()),
                Reply::Fault(FaultCode::Limit2Tripped),
            ]
        );
    }

    #[test]
    fn test_home_then_limit_same_cycle() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Home { forward: true }, 10);
        assert_eq!(ctrl.mode(), Mode::Homing);

        // Both sensors trip at once: home completion runs first, the limit
        // still escalates afterwards
        pins.home.set(true);
        pins.limit_1.set(true);
        ctrl.cycle(None, 20);
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(
            ctrl.replies(),
            &[
                Reply::done(&0i32.to_le_bytes()),
                Reply::Fault(FaultCode::Limit1Tripped),
            ]
        );
        assert_eq!(ctrl.actuator().hard_stops, 2);
    }

    #[test]
    fn test_fault_latches_until_reset() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        pins.limit_1.set(true);
        ctrl.cycle(None, 10);
        assert_eq!(ctrl.mode(), Mode::Fault);

        // Sensor released, fault stays latched and motion is refused
        pins.limit_1.set(false);
        send(&mut ctrl, Command::Goto(50), 20);
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::NotAcknowledged)]
        );
        assert_eq!(ctrl.actuator().target, 0);

        send(&mut ctrl, Command::Home { forward: true }, 30);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::NotAcknowledged)]
        );

        // Reset clears the latch and restores the defaults
        send(&mut ctrl, Command::Reset, 40);
        assert_eq!(ctrl.mode(), Mode::Idle);
        assert_eq!(ctrl.replies(), &[Reply::ack(&[])]);
        assert_eq!(ctrl.actuator().inits, 2);
        assert!(ctrl.actuator().enabled);
    }

    #[test]
    fn test_reset_with_invalid_defaults_stays_faulted() {
        let pins = Pins::new();
        let bad = Settings {
            microstep_res: 5,
            ..DEFAULT_SETTINGS
        };
        let mut ctrl = pins.controller_with(bad);
        ctrl.boot(0);
        assert_eq!(ctrl.mode(), Mode::Fault);

        send(&mut ctrl, Command::Reset, 10);
        assert_eq!(ctrl.mode(), Mode::Fault);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::InvalidParameters)]
        );
    }

    #[test]
    fn test_reset_restores_defaults_over_updates() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let updated = Settings {
            top_speed: 9000,
            ..DEFAULT_SETTINGS
        };
        send(&mut ctrl, Command::UpdateParameters(updated), 10);
        assert_eq!(ctrl.settings().top_speed, 9000);

        send(&mut ctrl, Command::Reset, 20);
        assert_eq!(ctrl.settings(), &DEFAULT_SETTINGS);
    }

    #[test]
    fn test_update_parameters_roundtrip() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let updated = Settings {
            run_current: 20,
            sleep_timeout: 50,
            ..DEFAULT_SETTINGS
        };
        send(&mut ctrl, Command::UpdateParameters(updated), 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&[])]);
        assert_eq!(ctrl.settings(), &updated);
        assert_eq!(ctrl.actuator().applies, 2);

        send(&mut ctrl, Command::Query(QueryKind::Parameters), 20);
        assert_eq!(ctrl.replies(), &[Reply::ack(&updated.to_bytes())]);
    }

    #[test]
    fn test_update_rejects_invalid_candidate() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let bad = Settings {
            accel: 60_000,
            ..DEFAULT_SETTINGS
        };
        send(&mut ctrl, Command::UpdateParameters(bad), 10);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::InvalidParameters)]
        );
        assert_eq!(ctrl.settings(), &DEFAULT_SETTINGS);
        assert_eq!(ctrl.actuator().applies, 1);
    }

    #[test]
    fn test_update_rejects_wrong_length_payload() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let frame = [b'U', 1, 2, 3];
        ctrl.cycle(Some(&frame), 10);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::InvalidParameters)]
        );
        assert_eq!(ctrl.settings(), &DEFAULT_SETTINGS);
    }

    #[test]
    fn test_unknown_command_not_acknowledged() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        ctrl.cycle(Some(&[0x7A]), 10);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::NotAcknowledged)]
        );
        assert_eq!(ctrl.mode(), Mode::Idle);

        ctrl.cycle(Some(&[b'Q', 0x44]), 20);
        assert_eq!(
            ctrl.replies(),
            &[Reply::Fault(FaultCode::NotAcknowledged)]
        );
        assert_eq!(ctrl.mode(), Mode::Idle);
    }

    #[test]
    fn test_query_identity() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        send(&mut ctrl, Command::Query(QueryKind::Model), 10);
        assert_eq!(ctrl.replies(), &[Reply::ack(&MODEL_ID.to_le_bytes())]);

        send(&mut ctrl, Command::Query(QueryKind::Serial), 20);
        assert_eq!(ctrl.replies(), &[Reply::ack(&SERIAL_ID.to_le_bytes())]);
    }

    #[test]
    fn test_idle_times_out_to_sleep_once() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let timeout_ms = DEFAULT_SETTINGS.sleep_timeout as u32 * SLEEP_TIME_UNIT_MS;

        ctrl.cycle(None, timeout_ms);
        assert_eq!(ctrl.mode(), Mode::Idle); // boundary not yet exceeded

        ctrl.cycle(None, timeout_ms + 1);
        assert_eq!(ctrl.mode(), Mode::Sleep);
        assert_eq!(ctrl.actuator().current, DEFAULT_SETTINGS.sleep_current);

        // Stays asleep, animating the indicator
        ctrl.cycle(None, timeout_ms + 513);
        assert_eq!(ctrl.mode(), Mode::Sleep);
        assert_eq!(ctrl.indicator().last_pulse, 128);
        assert_eq!(ctrl.indicator().pulses, 1);
    }

    #[test]
    fn test_sleep_wakes_on_motion_command() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let timeout_ms = DEFAULT_SETTINGS.sleep_timeout as u32 * SLEEP_TIME_UNIT_MS;
        ctrl.cycle(None, timeout_ms + 1);
        assert_eq!(ctrl.mode(), Mode::Sleep);

        send(&mut ctrl, Command::Goto(8), timeout_ms + 100);
        assert_eq!(ctrl.mode(), Mode::Moving);
        assert_eq!(ctrl.actuator().current, DEFAULT_SETTINGS.run_current);
    }

    #[test]
    fn test_timer_wraparound() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(u32::MAX - 10);

        // The millisecond counter rolls over while idle
        ctrl.cycle(None, 5_000);
        assert_eq!(ctrl.mode(), Mode::Idle);

        let timeout_ms = DEFAULT_SETTINGS.sleep_timeout as u32 * SLEEP_TIME_UNIT_MS;
        ctrl.cycle(None, timeout_ms.wrapping_add(u32::MAX - 9));
        assert_eq!(ctrl.mode(), Mode::Sleep);
    }

    #[test]
    fn test_sleep_pulse_curve() {
        assert_eq!(sleep_pulse_level(0), 0);
        assert_eq!(sleep_pulse_level(512), 128);
        assert_eq!(sleep_pulse_level(1023), 255);
        assert_eq!(sleep_pulse_level(1536), 127);
        assert_eq!(sleep_pulse_level(2047), 0);
        // Periodic
        assert_eq!(
            sleep_pulse_level(100),
            sleep_pulse_level(100 + SLEEP_PULSE_PERIOD_MS)
        );
    }

    #[derive(Default)]
    struct LoopTransport {
        inbound: Deque<CommandFrame, 4>,
        sent: Vec<Reply, 8>,
    }

    impl Transport for LoopTransport {
        fn poll_frame(&mut self) -> Option<CommandFrame> {
            self.inbound.pop_front()
        }

        fn send(&mut self, frame: &[u8]) {
            let _ = self.sent.push(Reply::parse(frame).unwrap());
        }
    }

    #[test]
    fn test_service_pumps_transport() {
        let pins = Pins::new();
        let mut ctrl = pins.controller();
        ctrl.boot(0);

        let mut link = LoopTransport::default();
        link.inbound.push_back(Command::Echo.encode()).unwrap();
        link.inbound
            .push_back(Command::Query(QueryKind::Model).encode())
            .unwrap();

        ctrl.service(&mut link, 10);
        ctrl.service(&mut link, 20);
        // Idle cycle with nothing pending sends nothing
        ctrl.service(&mut link, 30);

        assert_eq!(
            link.sent.as_slice(),
            &[Reply::ack(&[]), Reply::ack(&MODEL_ID.to_le_bytes())]
        );
    }
}
