//! Motor driver — analog triggers to H-bridge direction + duty.
//!
//! ```text
//!                 A only                      B only
//!   REVERSE ◀──────────── STOPPED ────────────▶ FORWARD
//!      │  ▲                 ▲  ▲                 ▲  │
//!      │  └──── A only ─────┼──┼───── B only ────┘  │
//!      └──── neither ───────┘  └──── neither ───────┘
//! ```
//!
//! With both triggers pressed the last remembered direction holds until
//! the other trigger is pressed alone, which keeps duty from oscillating
//! when both are partially squeezed.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};
use crate::pins::{OutputLine, PwmChannel};

/// Remembered drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerDirection {
    #[default]
    None,
    Reverse,
    Forward,
}

/// Ephemeral per-poll motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorCommand {
    pub direction: TriggerDirection,
    pub duty: u8,
}

impl MotorCommand {
    pub const STOP: Self = Self {
        direction: TriggerDirection::None,
        duty: 0,
    };

    pub fn is_stopped(&self) -> bool {
        self.direction == TriggerDirection::None
    }
}

/// Trigger magnitude → duty scaling.
#[derive(Debug, Clone, Copy)]
pub struct TriggerScale {
    pub noise_threshold: u16,
    pub max: u16,
}

impl TriggerScale {
    pub fn pressed(&self, magnitude: u16) -> bool {
        magnitude > self.noise_threshold
    }

    /// Linear 0..=max → 0..=255, rounded to nearest.
    pub fn duty(&self, magnitude: u16) -> u8 {
        if self.max == 0 {
            return 0;
        }
        let m = u32::from(magnitude.min(self.max));
        let max = u32::from(self.max);
        ((m * 255 + max / 2) / max) as u8
    }
}

/// Compute the next command for one controller and update its memory.
///
/// `trigger_a` drives reverse, `trigger_b` drives forward.
pub fn resolve(
    trigger_a: u16,
    trigger_b: u16,
    last: &mut TriggerDirection,
    scale: &TriggerScale,
) -> MotorCommand {
    let a = scale.pressed(trigger_a);
    let b = scale.pressed(trigger_b);

    let direction = match (a, b) {
        (false, false) => TriggerDirection::None,
        (true, false) => TriggerDirection::Reverse,
        (false, true) => TriggerDirection::Forward,
        (true, true) => match *last {
            TriggerDirection::None if trigger_a > trigger_b => TriggerDirection::Reverse,
            TriggerDirection::None if trigger_b > trigger_a => TriggerDirection::Forward,
            held => held,
        },
    };
    *last = direction;

    match direction {
        TriggerDirection::None => MotorCommand::STOP,
        TriggerDirection::Reverse => MotorCommand {
            direction,
            duty: scale.duty(trigger_a),
        },
        TriggerDirection::Forward => MotorCommand {
            direction,
            duty: scale.duty(trigger_b),
        },
    }
}

/// Owns the physical motor outputs and suppresses redundant writes.
#[derive(Debug, Default)]
pub struct MotorDriver {
    applied: MotorCommand,
}

impl MotorDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> MotorCommand {
        self.applied
    }

    pub fn apply(
        &mut self,
        cmd: MotorCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if cmd == self.applied {
            return;
        }

        let mut duty_on_wire = self.applied.duty;
        if cmd.direction != self.applied.direction {
            // Coast through zero before flipping the bridge.
            if duty_on_wire != 0 {
                hw.set_pwm_duty(PwmChannel::Motor, 0);
                duty_on_wire = 0;
            }
            if cmd.direction != TriggerDirection::None {
                hw.set_digital_output(
                    OutputLine::MotorDirection,
                    cmd.direction == TriggerDirection::Forward,
                );
            }
            sink.emit(&AppEvent::MotorDirectionChanged {
                from: self.applied.direction,
                to: cmd.direction,
            });
        }

        if cmd.duty != duty_on_wire {
            hw.set_pwm_duty(PwmChannel::Motor, cmd.duty);
        }
        debug!("motor: {:?} duty={}", cmd.direction, cmd.duty);
        self.applied = cmd;
    }

    /// Force duty 0 regardless of the remembered command.
    pub fn stop(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.set_pwm_duty(PwmChannel::Motor, 0);
        if self.applied.direction != TriggerDirection::None {
            sink.emit(&AppEvent::MotorDirectionChanged {
                from: self.applied.direction,
                to: TriggerDirection::None,
            });
        }
        self.applied = MotorCommand::STOP;
    }
}
