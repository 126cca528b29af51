//! End-to-end tests through the production adapters.
//!
//! The radio side publishes through a real [`GamepadFeed`], outputs go
//! through a real [`HardwareAdapter`] onto `embedded-hal` pin doubles, and
//! events are rendered by [`LogEventSink`].

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use vinebot::adapters::gamepad::GamepadFeed;
use vinebot::adapters::hardware::HardwareAdapter;
use vinebot::adapters::log_sink::LogEventSink;
use vinebot::adapters::time::MonotonicClock;
use vinebot::app::ports::ClockPort;
use vinebot::app::service::AppService;
use vinebot::config::ControllerConfig;
use vinebot::control::selector::{Mode, Section};
use vinebot::control::valves::MainValve;
use vinebot::input::{buttons, dpad, GamepadReport, SessionHandle};
use vinebot::pins::OutputLine;

type Levels = Rc<RefCell<[bool; OutputLine::COUNT]>>;

struct BoardPin {
    index: usize,
    levels: Levels,
}

impl ErrorType for BoardPin {
    type Error = Infallible;
}

impl OutputPin for BoardPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut()[self.index] = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut()[self.index] = true;
        Ok(())
    }
}

struct BoardPwm(Rc<Cell<u16>>);

impl pwm::ErrorType for BoardPwm {
    type Error = Infallible;
}

impl SetDutyCycle for BoardPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.0.set(duty);
        Ok(())
    }
}

fn board() -> (HardwareAdapter<BoardPin, BoardPwm>, Levels, Rc<Cell<u16>>) {
    let levels: Levels = Rc::new(RefCell::new([false; OutputLine::COUNT]));
    let duty = Rc::new(Cell::new(0));
    let pins = core::array::from_fn(|index| BoardPin {
        index,
        levels: Rc::clone(&levels),
    });
    (
        HardwareAdapter::new(pins, BoardPwm(Rc::clone(&duty))),
        levels,
        duty,
    )
}

const H: SessionHandle = SessionHandle(42);

#[test]
fn feed_to_pins_round_trip() {
    let feed = GamepadFeed::new();
    let mut input = feed.input();
    let (mut hw, levels, duty) = board();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(ControllerConfig::default());
    app.start(&mut hw, &mut sink);

    feed.connected(H, true);
    feed.publish(
        H,
        GamepadReport {
            dpad: dpad::UP,
            trigger_b: 1023,
            ..Default::default()
        },
    );
    app.tick(100, &mut input, &mut hw, &mut sink);

    assert!(levels.borrow()[OutputLine::MainFill.index()]);
    assert!(!levels.borrow()[OutputLine::MainExhaust.index()]);
    assert!(levels.borrow()[OutputLine::MotorDirection.index()]);
    assert_eq!(duty.get(), 255);
    assert_eq!(hw.write_failures(), 0);
    assert!(sink.emitted() > 0);

    let palette = app.config().palette;
    assert_eq!(
        feed.take_indicator(),
        Some((H, palette.colour(Mode::FillBias, Section::One)))
    );
}

#[test]
fn radio_disconnect_releases_pins() {
    let feed = GamepadFeed::new();
    let mut input = feed.input();
    let (mut hw, levels, _) = board();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(ControllerConfig::default());
    app.start(&mut hw, &mut sink);

    feed.connected(H, true);
    feed.publish(
        H,
        GamepadReport {
            buttons: buttons::Y,
            ..Default::default()
        },
    );
    app.tick(100, &mut input, &mut hw, &mut sink);
    let top = OutputLine::Pouch {
        section: Section::One,
        pouch: vinebot::control::valves::Pouch::Top,
    };
    assert!(levels.borrow()[top.index()]);

    feed.disconnected(H);
    app.tick(110, &mut input, &mut hw, &mut sink);
    assert!(levels.borrow().iter().all(|high| !high));
}

#[test]
fn runs_on_the_monotonic_clock() {
    let feed = GamepadFeed::new();
    let mut input = feed.input();
    let (mut hw, levels, _) = board();
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();
    let mut app = AppService::new(ControllerConfig::default());
    app.start(&mut hw, &mut sink);

    feed.connected(H, true);
    feed.publish(
        H,
        GamepadReport {
            dpad: dpad::DOWN,
            ..Default::default()
        },
    );
    app.tick(clock.now_millis(), &mut input, &mut hw, &mut sink);
    assert!(levels.borrow()[OutputLine::MainExhaust.index()]);
    assert_eq!(app.poll_count(), 1);
}

#[test]
fn disconnect_survives_a_flooded_session_queue() {
    let feed = GamepadFeed::new();
    let mut input = feed.input();
    let (mut hw, levels, _) = board();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(ControllerConfig::default());
    app.start(&mut hw, &mut sink);

    feed.connected(H, true);
    feed.publish(
        H,
        GamepadReport {
            dpad: dpad::UP,
            ..Default::default()
        },
    );
    app.tick(100, &mut input, &mut hw, &mut sink);
    assert!(levels.borrow()[OutputLine::MainFill.index()]);

    // A chattering second radio fills the queue before H leaves.
    let chatter = SessionHandle(7);
    for _ in 0..16 {
        feed.connected(chatter, false);
    }
    feed.disconnected(H);

    for t in (110..=600).step_by(10) {
        app.tick(t, &mut input, &mut hw, &mut sink);
    }
    assert!(app.occupied_slots().iter().all(|&(_, h)| h != H));
    assert_eq!(app.main_valve(), MainValve::Hold);
    assert!(!levels.borrow()[OutputLine::MainFill.index()]);
}
