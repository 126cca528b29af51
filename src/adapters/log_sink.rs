//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one tagged line per application
//! event to the ESP-IDF logger (which goes to UART / USB-CDC in
//! production).  Purely observational.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written since boot.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Started => {
                info!("START | control loop running");
            }
            AppEvent::ControllerConnected { slot, handle } => {
                info!("SLOT  | {} <- {:?} connected", slot, handle);
            }
            AppEvent::ControllerDisconnected { slot, handle } => {
                info!("SLOT  | {} <- {:?} disconnected", slot, handle);
            }
            AppEvent::ControllerRejected { handle, reason } => {
                warn!("SLOT  | {:?} rejected: {}", handle, reason);
            }
            AppEvent::ModeToggled { slot, mode } => {
                info!("MODE  | slot {} -> {:?}", slot, mode);
            }
            AppEvent::SectionToggled { slot, section } => {
                info!("SECT  | slot {} -> {:?}", slot, section);
            }
            AppEvent::IdleChanged { slot, idle } => {
                info!("IDLE  | slot {} {}", slot, if *idle { "idle" } else { "active" });
            }
            AppEvent::IndicatorChanged { slot, rgb: (r, g, b) } => {
                info!("LED   | slot {} rgb=({},{},{})", slot, r, g, b);
            }
            AppEvent::MainValveChanged { from, to } => {
                info!("VALVE | main {:?} -> {:?}", from, to);
            }
            AppEvent::PouchChanged {
                section,
                pouch,
                open,
            } => {
                info!(
                    "VALVE | pouch {:?}/{:?} {}",
                    section,
                    pouch,
                    if *open { "ON" } else { "OFF" }
                );
            }
            AppEvent::ExhaustOverride { slot, active } => {
                info!(
                    "VALVE | slot {} exhaust override {}",
                    slot,
                    if *active { "latched" } else { "dropped" }
                );
            }
            AppEvent::MotorDirectionChanged { from, to } => {
                info!("MOTOR | {:?} -> {:?}", from, to);
            }
            AppEvent::AllReleased { reason } => {
                warn!("SAFE  | all outputs released ({})", reason);
            }
        }
    }
}
