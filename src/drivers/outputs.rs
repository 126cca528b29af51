//! `embedded-hal` 1.0 output drivers over the ESP-IDF GPIO/LEDC helpers.
//!
//! [`GpioLine`] is one solenoid (or the motor direction) line and
//! implements [`OutputPin`]; [`LedcChannel`] is the motor PWM channel
//! and implements [`SetDutyCycle`].  Both are dumb actuators: ordering
//! and interlocks live in the control layer.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real GPIO and LEDC via hw_init helpers.
//! On host/test: the hw_init helpers are no-ops; state is tracked in-memory.

use embedded_hal::digital::{self, ErrorKind, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::{self, ErrorType, SetDutyCycle};

use crate::drivers::hw_init;
use crate::pins::{OutputLine, PwmChannel, PWM_RESOLUTION_BITS};

/// Raw `esp_err_t` returned by a failed driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EspError(pub i32);

impl digital::Error for EspError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl pwm::Error for EspError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

// ── Digital lines ─────────────────────────────────────────────

pub struct GpioLine {
    gpio: i32,
    level: bool,
}

impl GpioLine {
    /// Wrap a pin already configured as output by `hw_init`.
    pub fn new(line: OutputLine) -> Self {
        Self {
            gpio: line.gpio(),
            level: false,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    fn write(&mut self, high: bool) -> Result<(), EspError> {
        hw_init::gpio_write(self.gpio, high).map_err(EspError)?;
        self.level = high;
        Ok(())
    }
}

impl digital::ErrorType for GpioLine {
    type Error = EspError;
}

impl OutputPin for GpioLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl StatefulOutputPin for GpioLine {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level)
    }
}

// ── PWM channel ───────────────────────────────────────────────

pub struct LedcChannel {
    channel: u32,
    duty: u16,
}

impl LedcChannel {
    pub fn new(channel: PwmChannel) -> Self {
        Self {
            channel: channel.ledc_channel(),
            duty: 0,
        }
    }

    pub fn current_duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for LedcChannel {
    type Error = EspError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        (1u16 << PWM_RESOLUTION_BITS) - 1
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = duty.min(self.max_duty_cycle());
        hw_init::ledc_set(self.channel, duty as u8).map_err(EspError)?;
        self.duty = duty;
        Ok(())
    }
}
