//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (gamepad input, valve/motor outputs, clock, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Every output primitive is synchronous, immediate, and infallible from
//! the core's point of view; adapters absorb and log driver errors.

use crate::control::selector::Rgb;
use crate::input::{GamepadReport, SessionEvent, SessionHandle};
use crate::pins::{OutputLine, PwmChannel};

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: radio stack → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port onto the wireless input stack.
pub trait InputPort {
    /// Give the radio/session stack a chance to run and refresh reports.
    /// This is the only point in a poll cycle allowed to block or yield.
    fn update(&mut self);

    /// Next pending connect/disconnect notification, oldest first.
    fn next_session_event(&mut self) -> Option<SessionEvent>;

    /// Latest report for `handle`; `None` for unknown sessions.
    /// Reading clears the report's fresh-data flag.
    fn read(&mut self, handle: SessionHandle) -> Option<GamepadReport>;
}

/// Per-controller RGB indicator.
pub trait IndicatorPort {
    fn set_indicator_color(&mut self, handle: SessionHandle, rgb: Rgb);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    /// Set logic level on a digital output line (valve solenoids, motor
    /// direction).
    fn set_digital_output(&mut self, line: OutputLine, high: bool);

    /// Set 8-bit duty on a PWM channel.
    fn set_pwm_duty(&mut self, channel: PwmChannel, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock (wraps at `u32::MAX`).
pub trait ClockPort {
    fn now_millis(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Purely observational: nothing a sink does feeds
/// back into control decisions.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
