//! Fuzz target: `AppService::tick` over an arbitrary session/report stream
//!
//! Every 8-byte chunk of input is one poll: an opcode byte (connect,
//! disconnect, report, or release-all), a session byte, a time step, and
//! a packed report.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Main FILL and main EXHAUST are never energised together
//! - Two energising valve writes are never closer than the dead-time
//!
//! cargo fuzz run fuzz_control_cycle

#![no_main]

use std::collections::{HashMap, VecDeque};

use libfuzzer_sys::fuzz_target;
use vinebot::app::commands::AppCommand;
use vinebot::app::events::AppEvent;
use vinebot::app::ports::{ActuatorPort, EventSink, IndicatorPort, InputPort};
use vinebot::app::service::AppService;
use vinebot::config::ControllerConfig;
use vinebot::control::selector::Rgb;
use vinebot::input::{GamepadReport, SessionEvent, SessionHandle};
use vinebot::pins::{OutputLine, PwmChannel};

#[derive(Default)]
struct Pad {
    events: VecDeque<SessionEvent>,
    reports: HashMap<SessionHandle, GamepadReport>,
}

impl InputPort for Pad {
    fn update(&mut self) {}

    fn next_session_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    fn read(&mut self, handle: SessionHandle) -> Option<GamepadReport> {
        let r = self.reports.get_mut(&handle)?;
        let out = *r;
        r.has_fresh_data = false;
        Some(out)
    }
}

impl IndicatorPort for Pad {
    fn set_indicator_color(&mut self, _handle: SessionHandle, _rgb: Rgb) {}
}

#[derive(Default)]
struct Outputs {
    now_ms: u32,
    deadtime_ms: u32,
    levels: [bool; OutputLine::COUNT],
    last_energise: Option<u32>,
}

impl ActuatorPort for Outputs {
    fn set_digital_output(&mut self, line: OutputLine, high: bool) {
        self.levels[line.index()] = high;
        assert!(
            !(self.levels[OutputLine::MainFill.index()]
                && self.levels[OutputLine::MainExhaust.index()]),
            "FILL and EXHAUST energised together"
        );
        if high && line != OutputLine::MotorDirection {
            if let Some(prev) = self.last_energise {
                assert!(self.now_ms - prev >= self.deadtime_ms, "dead-time violated");
            }
            self.last_energise = Some(self.now_ms);
        }
    }

    fn set_pwm_duty(&mut self, _channel: PwmChannel, _duty: u8) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = ControllerConfig::default();
    let mut hw = Outputs {
        deadtime_ms: config.deadtime_ms,
        ..Default::default()
    };
    let mut app = AppService::new(config);
    let mut pad = Pad::default();
    app.start(&mut hw, &mut Discard);

    let mut now_ms: u32 = 0;
    for chunk in data.chunks_exact(8) {
        // Bounded steps keep the clock far from wrap-around.
        now_ms += u32::from(chunk[2]);
        hw.now_ms = now_ms;
        let handle = SessionHandle(u32::from(chunk[1] % 6));

        match chunk[0] % 8 {
            0 => {
                let is_gamepad = chunk[1] & 0x80 == 0;
                pad.reports.entry(handle).or_insert(GamepadReport {
                    connected: true,
                    is_gamepad,
                    ..Default::default()
                });
                pad.events
                    .push_back(SessionEvent::Connected { handle, is_gamepad });
            }
            1 => {
                // Odd session bytes vanish without telling the loop.
                pad.reports.remove(&handle);
                if chunk[3] & 1 == 0 {
                    pad.events.push_back(SessionEvent::Disconnected { handle });
                }
            }
            2 => app.handle_command(AppCommand::ReleaseAll, now_ms, &mut hw, &mut Discard),
            _ => {
                pad.reports.insert(
                    handle,
                    GamepadReport {
                        connected: true,
                        has_fresh_data: true,
                        buttons: u16::from_le_bytes([chunk[3], chunk[4] & 0x03]),
                        dpad: chunk[5] & 0x0f,
                        trigger_a: u16::from(chunk[6]) << 2,
                        trigger_b: u16::from(chunk[7]) << 2,
                        is_gamepad: true,
                    },
                );
            }
        }
        app.tick(now_ms, &mut pad, &mut hw, &mut Discard);
    }
});
