//! Mock adapters for integration tests.
//!
//! [`MockHardware`] records every actuator call with the simulated time it
//! happened at, and panics the moment main FILL and main EXHAUST are both
//! energised.  [`MockGamepad`] stands in for the radio stack, and
//! [`LogSink`] collects emitted events.

use std::collections::{HashMap, VecDeque};

use vinebot::app::events::AppEvent;
use vinebot::app::ports::{ActuatorPort, EventSink, IndicatorPort, InputPort};
use vinebot::app::service::AppService;
use vinebot::config::ControllerConfig;
use vinebot::control::selector::Rgb;
use vinebot::input::{GamepadReport, SessionEvent, SessionHandle};
use vinebot::pins::{OutputLine, PwmChannel};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Digital { line: OutputLine, high: bool },
    Pwm { channel: PwmChannel, duty: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    pub at_ms: u32,
    pub call: ActuatorCall,
}

impl Write {
    /// A write that touches a valve solenoid (not the motor).
    pub fn is_valve(&self) -> bool {
        matches!(
            self.call,
            ActuatorCall::Digital { line, .. } if line != OutputLine::MotorDirection
        )
    }

    pub fn energises_valve(&self) -> bool {
        self.is_valve() && matches!(self.call, ActuatorCall::Digital { high: true, .. })
    }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Simulated time stamped onto each recorded write.
    pub now_ms: u32,
    pub writes: Vec<Write>,
    levels: [bool; OutputLine::COUNT],
    duty: u8,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            writes: Vec::new(),
            levels: [false; OutputLine::COUNT],
            duty: 0,
        }
    }

    pub fn is_high(&self, line: OutputLine) -> bool {
        self.levels[line.index()]
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
    }

    pub fn valve_writes(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter().filter(|w| w.is_valve())
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_digital_output(&mut self, line: OutputLine, high: bool) {
        self.levels[line.index()] = high;
        self.writes.push(Write {
            at_ms: self.now_ms,
            call: ActuatorCall::Digital { line, high },
        });
        assert!(
            !(self.is_high(OutputLine::MainFill) && self.is_high(OutputLine::MainExhaust)),
            "FILL and EXHAUST energised together at t={}ms",
            self.now_ms
        );
    }

    fn set_pwm_duty(&mut self, channel: PwmChannel, duty: u8) {
        self.duty = duty;
        self.writes.push(Write {
            at_ms: self.now_ms,
            call: ActuatorCall::Pwm { channel, duty },
        });
    }
}

// ── MockGamepad ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockGamepad {
    pub session_events: VecDeque<SessionEvent>,
    reports: HashMap<SessionHandle, GamepadReport>,
    pub indicator_writes: Vec<(SessionHandle, Rgb)>,
    pub updates: u32,
}

#[allow(dead_code)]
impl MockGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, handle: SessionHandle) {
        self.reports.insert(
            handle,
            GamepadReport {
                connected: true,
                is_gamepad: true,
                ..Default::default()
            },
        );
        self.session_events.push_back(SessionEvent::Connected {
            handle,
            is_gamepad: true,
        });
    }

    pub fn disconnect(&mut self, handle: SessionHandle) {
        self.reports.remove(&handle);
        self.session_events
            .push_back(SessionEvent::Disconnected { handle });
    }

    /// Drop the session's report without a disconnect notification.
    pub fn forget(&mut self, handle: SessionHandle) {
        self.reports.remove(&handle);
    }

    /// Queue a fresh report for the next poll.
    pub fn press(&mut self, handle: SessionHandle, buttons: u16, dpad: u8) {
        self.triggers(handle, buttons, dpad, 0, 0);
    }

    pub fn triggers(&mut self, handle: SessionHandle, buttons: u16, dpad: u8, a: u16, b: u16) {
        self.reports.insert(
            handle,
            GamepadReport {
                connected: true,
                has_fresh_data: true,
                buttons,
                dpad,
                trigger_a: a,
                trigger_b: b,
                is_gamepad: true,
            },
        );
    }

    pub fn last_indicator(&self, handle: SessionHandle) -> Option<Rgb> {
        self.indicator_writes
            .iter()
            .rev()
            .find(|(h, _)| *h == handle)
            .map(|(_, rgb)| *rgb)
    }
}

impl InputPort for MockGamepad {
    fn update(&mut self) {
        self.updates += 1;
    }

    fn next_session_event(&mut self) -> Option<SessionEvent> {
        self.session_events.pop_front()
    }

    fn read(&mut self, handle: SessionHandle) -> Option<GamepadReport> {
        let report = self.reports.get_mut(&handle)?;
        let snapshot = *report;
        report.has_fresh_data = false;
        Some(snapshot)
    }
}

impl IndicatorPort for MockGamepad {
    fn set_indicator_color(&mut self, handle: SessionHandle, rgb: Rgb) {
        self.indicator_writes.push((handle, rgb));
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: service + mocks on one simulated clock ──────────────

pub struct Rig {
    pub app: AppService,
    pub pad: MockGamepad,
    pub hw: MockHardware,
    pub sink: LogSink,
}

#[allow(dead_code)]
impl Rig {
    pub const H: SessionHandle = SessionHandle(1);

    /// Started service with controller [`Rig::H`] bound to slot 0 at t=0.
    pub fn connected(config: ControllerConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config),
            pad: MockGamepad::new(),
            hw: MockHardware::new(),
            sink: LogSink::new(),
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig.pad.connect(Self::H);
        rig.tick(0);
        rig.hw.clear_log();
        rig
    }

    pub fn tick(&mut self, now_ms: u32) {
        self.hw.now_ms = now_ms;
        self.app
            .tick(now_ms, &mut self.pad, &mut self.hw, &mut self.sink);
    }

    /// Fresh report for [`Rig::H`], then one poll.
    pub fn step(&mut self, now_ms: u32, buttons: u16, dpad: u8) {
        self.pad.press(Self::H, buttons, dpad);
        self.tick(now_ms);
    }
}
