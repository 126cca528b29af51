//! Integration tests for the AppService → slots → valves/motor pipeline.
//!
//! These run on the host (x86_64) and drive the full poll cycle from a
//! mocked gamepad down to recorded output writes, on a simulated clock.

use super::mock_hw::{ActuatorCall, Rig, Write};

use vinebot::app::commands::AppCommand;
use vinebot::app::events::AppEvent;
use vinebot::config::{ControllerConfig, MAX_CONTROLLERS};
use vinebot::control::motor::TriggerDirection;
use vinebot::control::selector::{Mode, Section};
use vinebot::control::valves::{MainValve, Pouch};
use vinebot::input::{buttons, dpad, SessionHandle};
use vinebot::pins::OutputLine;

const H: SessionHandle = Rig::H;

fn rig() -> Rig {
    Rig::connected(ControllerConfig::default())
}

fn high_at(writes: &[Write], line: OutputLine) -> Vec<u32> {
    writes
        .iter()
        .filter(|w| w.call == ActuatorCall::Digital { line, high: true })
        .map(|w| w.at_ms)
        .collect()
}

// ── Toggle correctness ───────────────────────────────────────

#[test]
fn held_mode_button_flips_mode_exactly_once() {
    let mut r = rig();
    for t in (10..=50).step_by(10) {
        r.step(t, buttons::L1, 0);
    }
    assert_eq!(r.app.slot(0).map(|s| s.mode()), Some(Mode::ExhaustBias));
    assert_eq!(
        r.sink.count(|e| matches!(e, AppEvent::ModeToggled { .. })),
        1
    );

    r.step(60, 0, 0);
    r.step(70, buttons::L1, 0);
    assert_eq!(r.app.slot(0).map(|s| s.mode()), Some(Mode::FillBias));
}

#[test]
fn mode_and_section_toggle_independently() {
    let mut r = rig();
    r.step(10, buttons::R1, 0);
    let slot = r.app.slot(0).unwrap();
    assert_eq!(slot.section(), Section::Two);
    assert_eq!(slot.mode(), Mode::FillBias);
}

// ── Idle indicator ───────────────────────────────────────────

#[test]
fn indicator_shows_idle_colour_only_while_idle() {
    let mut r = rig();
    let palette = r.app.config().palette;

    r.step(10, 0, 0);
    assert_eq!(r.pad.last_indicator(H), Some(palette.idle));

    r.step(20, 0, dpad::LEFT);
    assert_eq!(
        r.pad.last_indicator(H),
        Some(palette.colour(Mode::FillBias, Section::One))
    );

    r.step(30, 0, 0);
    assert_eq!(r.pad.last_indicator(H), Some(palette.idle));

    // Staying idle never rewrites the indicator.
    let writes = r.pad.indicator_writes.len();
    r.step(40, 0, 0);
    r.step(50, 0, 0);
    assert_eq!(r.pad.indicator_writes.len(), writes);
}

#[test]
fn toggle_updates_indicator_to_new_lookup() {
    let mut r = rig();
    let palette = r.app.config().palette;
    r.step(10, buttons::L1 | buttons::R1, 0);
    assert_eq!(
        r.pad.last_indicator(H),
        Some(palette.colour(Mode::ExhaustBias, Section::Two))
    );
}

// ── Main valve, dead-time, idempotence ──────────────────────

#[test]
fn opposing_dpad_resolves_to_hold() {
    let mut r = rig();
    r.step(100, 0, dpad::UP | dpad::DOWN);
    assert_eq!(r.app.main_valve(), MainValve::Hold);
    assert!(r.hw.valve_writes().next().is_none());
}

#[test]
fn fill_to_exhaust_waits_out_deadtime_through_hold() {
    let mut r = rig();
    r.step(100, 0, dpad::UP);
    r.step(110, 0, dpad::DOWN);
    assert_eq!(r.app.main_valve(), MainValve::Fill, "deferred inside dead-time");

    for t in (120..=250).step_by(10) {
        r.tick(t);
    }
    assert_eq!(r.app.main_valve(), MainValve::Exhaust);

    let writes = r.hw.writes.clone();
    assert_eq!(high_at(&writes, OutputLine::MainFill), vec![100]);
    assert_eq!(high_at(&writes, OutputLine::MainExhaust), vec![200]);
    let fill_off: Vec<u32> = writes
        .iter()
        .filter(|w| {
            w.call
                == ActuatorCall::Digital {
                    line: OutputLine::MainFill,
                    high: false,
                }
        })
        .map(|w| w.at_ms)
        .collect();
    assert_eq!(fill_off.first(), Some(&150), "HOLD inserted one dead-time after FILL");
}

#[test]
fn repeated_command_is_idempotent() {
    let mut r = rig();
    for t in (100..=1_000).step_by(5) {
        r.step(t, 0, dpad::UP);
    }
    assert_eq!(high_at(&r.hw.writes, OutputLine::MainFill), vec![100]);
    assert_eq!(
        r.sink
            .count(|e| matches!(e, AppEvent::MainValveChanged { .. })),
        1
    );
}

// ── Motor tie-break ──────────────────────────────────────────

#[test]
fn motor_tie_break_follows_last_direction() {
    let mut r = rig();

    r.pad.triggers(H, 0, 0, 600, 0);
    r.tick(10);
    assert_eq!(r.app.motor_command().direction, TriggerDirection::Reverse);
    assert_eq!(r.hw.duty(), 150);

    r.pad.triggers(H, 0, 0, 600, 600);
    r.tick(20);
    assert_eq!(r.app.motor_command().direction, TriggerDirection::Reverse);

    r.pad.triggers(H, 0, 0, 0, 600);
    r.tick(30);
    assert_eq!(r.app.motor_command().direction, TriggerDirection::Forward);
    assert!(r.hw.is_high(OutputLine::MotorDirection));
    assert_eq!(r.hw.duty(), 150);

    r.pad.triggers(H, 0, 0, 5, 10);
    r.tick(40);
    assert!(r.app.motor_command().is_stopped());
    assert_eq!(r.hw.duty(), 0);
}

#[test]
fn direction_change_coasts_through_zero_duty() {
    let mut r = rig();
    r.pad.triggers(H, 0, 0, 1023, 0);
    r.tick(10);
    r.hw.clear_log();
    r.pad.triggers(H, 0, 0, 0, 1023);
    r.tick(20);

    let calls: Vec<ActuatorCall> = r.hw.writes.iter().map(|w| w.call).collect();
    assert_eq!(
        calls,
        vec![
            ActuatorCall::Pwm {
                channel: vinebot::pins::PwmChannel::Motor,
                duty: 0
            },
            ActuatorCall::Digital {
                line: OutputLine::MotorDirection,
                high: true
            },
            ActuatorCall::Pwm {
                channel: vinebot::pins::PwmChannel::Motor,
                duty: 255
            },
        ]
    );
}

#[test]
fn both_triggers_from_stopped_pick_the_stronger() {
    let mut r = rig();
    r.pad.triggers(H, 0, 0, 700, 600);
    r.tick(10);
    assert_eq!(r.app.motor_command().direction, TriggerDirection::Reverse);

    let mut r = rig();
    r.pad.triggers(H, 0, 0, 600, 600);
    r.tick(10);
    assert!(r.app.motor_command().is_stopped());
}

// ── Pouch valves ─────────────────────────────────────────────

#[test]
fn pouch_override_exhausts_main_and_leaves_pouch_off() {
    let mut r = rig();
    let left = OutputLine::Pouch {
        section: Section::One,
        pouch: Pouch::Left,
    };

    r.step(100, buttons::A, 0);
    r.step(200, buttons::A | buttons::X, 0);
    assert!(r.hw.is_high(OutputLine::MainExhaust));
    assert!(!r.hw.is_high(OutputLine::MainFill));
    assert!(!r.hw.is_high(left));

    r.step(300, buttons::A, 0);
    assert!(!r.hw.is_high(OutputLine::MainExhaust));
    assert!(!r.hw.is_high(left));
    assert_eq!(r.app.main_valve(), MainValve::Hold);
}

#[test]
fn exhaust_bias_mode_overrides_without_modifier() {
    let mut r = rig();
    r.step(10, buttons::L1, 0);
    r.step(20, 0, 0);
    r.step(100, buttons::Y, 0);
    assert_eq!(r.app.main_valve(), MainValve::Exhaust);
    assert!(!r.app.pouch_open(Section::One, Pouch::Top));
}

#[test]
fn pouch_press_and_release() {
    let mut r = rig();
    r.step(100, buttons::B, 0);
    assert!(r.app.pouch_open(Section::One, Pouch::Right));
    assert!(r.hw.is_high(OutputLine::Pouch {
        section: Section::One,
        pouch: Pouch::Right
    }));

    // Release is honoured immediately, inside the dead-time.
    r.step(110, 0, 0);
    assert!(!r.app.pouch_open(Section::One, Pouch::Right));
}

#[test]
fn simultaneous_pouch_presses_are_spaced_by_deadtime() {
    let mut r = rig();
    r.step(100, buttons::X | buttons::Y, 0);
    assert!(r.app.pouch_open(Section::One, Pouch::Left));
    assert!(!r.app.pouch_open(Section::One, Pouch::Top));

    r.tick(149);
    assert!(!r.app.pouch_open(Section::One, Pouch::Top));
    r.tick(150);
    assert!(r.app.pouch_open(Section::One, Pouch::Top));
}

#[test]
fn section_switch_leaves_open_pouch_energised_until_released_there() {
    let mut r = rig();
    let s1_left = OutputLine::Pouch {
        section: Section::One,
        pouch: Pouch::Left,
    };

    r.step(100, buttons::X, 0);
    assert!(r.hw.is_high(s1_left));

    r.step(200, buttons::X | buttons::R1, 0);
    r.step(300, buttons::X, 0);
    assert_eq!(r.app.slot(0).unwrap().section(), Section::Two);
    assert!(r.hw.is_high(s1_left), "toggle does not close section 1");

    // Releasing while section 2 is active does not reach section 1.
    r.step(400, 0, 0);
    assert!(r.hw.is_high(s1_left));
    assert!(r.app.pouch_open(Section::One, Pouch::Left));

    // Back to section 1, press and release closes it.
    r.step(500, buttons::R1, 0);
    r.step(600, buttons::X, 0);
    r.step(700, 0, 0);
    assert!(!r.hw.is_high(s1_left));
}

#[test]
fn section_two_buttons_drive_section_two_lines() {
    let mut r = rig();
    r.step(10, buttons::R1, 0);
    r.step(100, buttons::Y, 0);
    assert!(r.hw.is_high(OutputLine::Pouch {
        section: Section::Two,
        pouch: Pouch::Top
    }));
    assert!(!r.app.pouch_open(Section::One, Pouch::Top));
}

// ── Sessions ─────────────────────────────────────────────────

#[test]
fn disconnect_releases_all_outputs() {
    let mut r = rig();
    r.pad.triggers(H, buttons::X, dpad::UP, 800, 0);
    r.tick(100);
    r.tick(150);
    assert!(r.hw.is_high(OutputLine::MainFill));
    assert!(r.app.pouch_open(Section::One, Pouch::Left));

    r.pad.disconnect(H);
    r.tick(160);
    for line in OutputLine::all() {
        if line != OutputLine::MotorDirection {
            assert!(!r.hw.is_high(line), "{:?} still energised", line);
        }
    }
    assert_eq!(r.hw.duty(), 0);
    assert!(r.app.occupied_slots().is_empty());
    assert_eq!(
        r.sink.count(|e| matches!(e, AppEvent::AllReleased { .. })),
        1
    );
}

#[test]
fn controller_lost_without_notice_releases_outputs() {
    let mut r = rig();
    r.step(100, buttons::X, dpad::UP);
    r.tick(150);
    assert!(r.hw.is_high(OutputLine::MainFill));

    r.pad.forget(H);
    r.tick(160);
    assert!(r.app.occupied_slots().is_empty());
    assert!(!r.hw.is_high(OutputLine::MainFill));
    assert!(!r.app.pouch_open(Section::One, Pouch::Left));
    assert_eq!(
        r.sink
            .count(|e| matches!(e, AppEvent::ControllerDisconnected { handle, .. } if *handle == H)),
        1
    );

    // Nothing is re-driven afterwards.
    r.hw.clear_log();
    for t in (200..=500).step_by(50) {
        r.tick(t);
    }
    assert!(r.hw.writes.is_empty());
}

#[test]
fn disconnect_without_release_keeps_last_commanded_state() {
    let mut r = Rig::connected(ControllerConfig {
        release_on_disconnect: false,
        ..Default::default()
    });
    r.step(100, buttons::X, dpad::UP);
    r.tick(150);
    r.pad.disconnect(H);
    r.tick(160);
    r.tick(1_000);
    assert!(r.hw.is_high(OutputLine::MainFill));
    assert!(r.app.pouch_open(Section::One, Pouch::Left));
}

#[test]
fn release_all_command_forces_safe_state() {
    let mut r = rig();
    r.step(100, 0, dpad::DOWN);
    assert!(r.hw.is_high(OutputLine::MainExhaust));

    r.hw.now_ms = 110;
    r.app
        .handle_command(AppCommand::ReleaseAll, 110, &mut r.hw, &mut r.sink);
    assert!(!r.hw.is_high(OutputLine::MainExhaust));
    assert_eq!(r.app.occupied_slots().len(), 1, "controllers stay bound");
}

#[test]
fn slots_keep_independent_state() {
    let mut r = rig();
    let other = SessionHandle(2);
    r.pad.connect(other);
    r.tick(5);
    r.pad.press(other, buttons::L1, 0);
    r.tick(10);
    assert_eq!(r.app.slot(1).map(|s| s.mode()), Some(Mode::ExhaustBias));
    assert_eq!(r.app.slot(0).map(|s| s.mode()), Some(Mode::FillBias));
}

#[test]
fn reports_for_unknown_sessions_are_ignored() {
    let mut r = rig();
    r.pad.press(SessionHandle(77), buttons::X, dpad::UP);
    r.tick(100);
    assert!(r.hw.writes.is_empty());
}

#[test]
fn table_full_rejects_extra_controller() {
    let mut r = rig();
    for i in 1..MAX_CONTROLLERS as u32 {
        r.pad.connect(SessionHandle(100 + i));
    }
    r.pad.connect(SessionHandle(999));
    r.tick(10);
    assert_eq!(r.app.occupied_slots().len(), MAX_CONTROLLERS);
    assert_eq!(
        r.sink
            .count(|e| matches!(e, AppEvent::ControllerRejected { .. })),
        1
    );
}

#[test]
fn reconnect_starts_from_defaults() {
    let mut r = rig();
    r.step(10, buttons::R1, 0);
    r.pad.disconnect(H);
    r.tick(20);
    r.pad.connect(H);
    r.tick(30);
    let slot = r.app.slot(0).unwrap();
    assert_eq!(slot.section(), Section::One);
    assert_eq!(slot.mode(), Mode::FillBias);
}
