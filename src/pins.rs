//! GPIO / peripheral pin assignments for the VineBot valve board.
//!
//! Single source of truth: the control core addresses outputs by
//! [`OutputLine`] / [`PwmChannel`] and only this module knows which GPIO
//! sits behind each one.

use crate::control::valves::{Pouch, POUCH_COUNT};
use crate::control::selector::Section;

// ---------------------------------------------------------------------------
// Main valve group (fill / exhaust solenoid pair)
// ---------------------------------------------------------------------------

/// Digital output: energises the main FILL solenoid (active HIGH).
pub const MAIN_FILL_GPIO: i32 = 25;
/// Digital output: energises the main EXHAUST solenoid (active HIGH).
pub const MAIN_EXHAUST_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Pouch valves: two interchangeable banks of LEFT / RIGHT / TOP
// ---------------------------------------------------------------------------

/// Section 1 pouch solenoids, indexed by [`Pouch`].
pub const SECTION_1_POUCH_GPIOS: [i32; POUCH_COUNT] = [16, 17, 18];
/// Section 2 pouch solenoids, indexed by [`Pouch`].
pub const SECTION_2_POUCH_GPIOS: [i32; POUCH_COUNT] = [19, 21, 22];

// ---------------------------------------------------------------------------
// Drive motor (H-bridge: direction line + PWM)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = forward, LOW = reverse.
pub const MOTOR_DIR_GPIO: i32 = 27;
/// LEDC PWM output for motor speed.
pub const MOTOR_PWM_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the drive motor (1 kHz).
pub const MOTOR_PWM_FREQ_HZ: u32 = 1_000;
/// LEDC channel carrying the motor duty.
pub const LEDC_CH_MOTOR: u32 = 0;

// ---------------------------------------------------------------------------
// Logical output identifiers
// ---------------------------------------------------------------------------

/// Every digital output line the control core may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLine {
    MainFill,
    MainExhaust,
    Pouch { section: Section, pouch: Pouch },
    MotorDirection,
}

impl OutputLine {
    /// Number of distinct lines (2 main + 2×3 pouch + motor direction).
    pub const COUNT: usize = 3 + 2 * POUCH_COUNT;

    /// Dense index, stable across builds; used to address pin arrays.
    pub fn index(self) -> usize {
        match self {
            Self::MainFill => 0,
            Self::MainExhaust => 1,
            Self::Pouch { section, pouch } => 2 + section.index() * POUCH_COUNT + pouch.index(),
            Self::MotorDirection => 2 + 2 * POUCH_COUNT,
        }
    }

    /// GPIO number wired to this line.
    pub fn gpio(self) -> i32 {
        match self {
            Self::MainFill => MAIN_FILL_GPIO,
            Self::MainExhaust => MAIN_EXHAUST_GPIO,
            Self::Pouch { section: Section::One, pouch } => SECTION_1_POUCH_GPIOS[pouch.index()],
            Self::Pouch { section: Section::Two, pouch } => SECTION_2_POUCH_GPIOS[pouch.index()],
            Self::MotorDirection => MOTOR_DIR_GPIO,
        }
    }

    /// All lines in [`index`](Self::index) order.
    pub fn all() -> [Self; Self::COUNT] {
        let mut lines = [Self::MainFill; Self::COUNT];
        lines[1] = Self::MainExhaust;
        for section in [Section::One, Section::Two] {
            for pouch in Pouch::ALL {
                let line = Self::Pouch { section, pouch };
                lines[line.index()] = line;
            }
        }
        lines[Self::MotorDirection.index()] = Self::MotorDirection;
        lines
    }
}

/// PWM channels the control core may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    Motor,
}

impl PwmChannel {
    pub fn ledc_channel(self) -> u32 {
        match self {
            Self::Motor => LEDC_CH_MOTOR,
        }
    }
}
