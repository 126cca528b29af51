//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port on every state transition.
//! Adapters on the other side decide what to do with them; the default
//! is one human-readable log line per event.

use crate::control::motor::TriggerDirection;
use crate::control::selector::{Mode, Rgb, Section};
use crate::control::valves::{MainValve, Pouch};
use crate::input::SessionHandle;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started.
    Started,

    /// A controller session was bound to a slot.
    ControllerConnected { slot: usize, handle: SessionHandle },

    /// A controller session was released from its slot.
    ControllerDisconnected { slot: usize, handle: SessionHandle },

    /// A session could not be bound (table full or not a gamepad).
    ControllerRejected { handle: SessionHandle, reason: &'static str },

    /// Mode flag flipped on a slot.
    ModeToggled { slot: usize, mode: Mode },

    /// Active section flipped on a slot.
    SectionToggled { slot: usize, section: Section },

    /// A slot entered or left idle.
    IdleChanged { slot: usize, idle: bool },

    /// A slot's indicator was rewritten.
    IndicatorChanged { slot: usize, rgb: Rgb },

    /// The main valve group moved.
    MainValveChanged { from: MainValve, to: MainValve },

    /// A pouch valve opened or closed.
    PouchChanged { section: Section, pouch: Pouch, open: bool },

    /// A slot latched or dropped the main-exhaust override.
    ExhaustOverride { slot: usize, active: bool },

    /// The drive motor changed direction (or stopped).
    MotorDirectionChanged { from: TriggerDirection, to: TriggerDirection },

    /// Every output was forced to its safe state.
    AllReleased { reason: &'static str },
}
