//! Hardware adapter — bridges real output pins to the domain's [`ActuatorPort`].
//!
//! Owns one [`OutputPin`] per [`OutputLine`] and the motor's
//! [`SetDutyCycle`] channel.  This is the only module in the system that
//! writes physical outputs.  Generic over `embedded-hal` 1.0 traits, so
//! the same adapter drives ESP-IDF pins on target and recording doubles
//! in tests.
//!
//! Driver errors never reach the control core: each one is logged,
//! counted, and the write is dropped.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::error::OutputError;
use crate::pins::{OutputLine, PwmChannel};

/// Concrete adapter that puts every output behind the port trait.
pub struct HardwareAdapter<P, M> {
    /// Indexed by [`OutputLine::index`].
    lines: [P; OutputLine::COUNT],
    motor_pwm: M,
    write_failures: u32,
    last_error: Option<OutputError>,
}

impl<P: OutputPin, M: SetDutyCycle> HardwareAdapter<P, M> {
    /// `lines[i]` must be the pin for the line whose `index()` is `i`.
    pub fn new(lines: [P; OutputLine::COUNT], motor_pwm: M) -> Self {
        Self {
            lines,
            motor_pwm,
            write_failures: 0,
            last_error: None,
        }
    }

    /// Driver errors swallowed since boot.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    pub fn last_error(&self) -> Option<OutputError> {
        self.last_error
    }

    fn record_failure(&mut self, err: OutputError) {
        self.write_failures = self.write_failures.wrapping_add(1);
        self.last_error = Some(err);
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, M: SetDutyCycle> ActuatorPort for HardwareAdapter<P, M> {
    fn set_digital_output(&mut self, line: OutputLine, high: bool) {
        let pin = &mut self.lines[line.index()];
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            warn!(
                "hw: {:?} <- {} failed on GPIO{}: {:?}",
                line,
                u8::from(high),
                line.gpio(),
                e
            );
            self.record_failure(OutputError::GpioWriteFailed);
        }
    }

    fn set_pwm_duty(&mut self, channel: PwmChannel, duty: u8) {
        let result = match channel {
            PwmChannel::Motor => self
                .motor_pwm
                .set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX)),
        };
        if let Err(e) = result {
            warn!("hw: {:?} duty {} failed: {:?}", channel, duty, e);
            self.record_failure(OutputError::PwmWriteFailed);
        }
    }
}
