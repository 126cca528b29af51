//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the controller slots, the valve bank, the motor
//! driver, and the shared output guard.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService        │
//! ActuatorPort ◀──│ Slots · Valves · Motor   │──▶ IndicatorPort
//!                 └──────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) is one poll cycle:
//!
//! 1. let the input stack run, drain connect/disconnect notifications
//! 2. digest each occupied slot's fresh report (toggles, idle, pouch edges);
//!    a slot whose session the stack no longer knows is freed
//! 3. merge the slots' standing intents
//! 4. drive the main group, retry latched pouches, apply the motor command

use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{ControllerConfig, MAX_CONTROLLERS};
use crate::control::motor::{MotorCommand, MotorDriver};
use crate::control::selector::Section;
use crate::control::valves::{MainValve, Pouch, ValveBank};
use crate::input::{SessionEvent, SessionHandle};
use crate::pins::{OutputLine, PwmChannel};
use crate::safety::OutputGuard;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, IndicatorPort, InputPort};
use super::slots::{ControllerSlot, PouchAction, SlotIntent, SlotRegistry, SlotUpdate};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: ControllerConfig,
    slots: SlotRegistry,
    valves: ValveBank,
    motor: MotorDriver,
    guard: OutputGuard,
    poll_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any output; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Self {
        let guard = OutputGuard::new(config.deadtime_ms);
        Self {
            config,
            slots: SlotRegistry::new(),
            valves: ValveBank::new(),
            motor: MotorDriver::new(),
            guard,
            poll_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its de-energised state and announce start.
    ///
    /// The initial writes do not stamp the guard: nothing was energised
    /// before them.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        for line in OutputLine::all() {
            hw.set_digital_output(line, false);
        }
        hw.set_pwm_duty(PwmChannel::Motor, 0);
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started (deadtime={}ms, slots={})",
            self.config.deadtime_ms, MAX_CONTROLLERS
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one poll cycle at `now_ms`.
    ///
    /// `io` satisfies **both** [`InputPort`] and [`IndicatorPort`], since
    /// the radio stack owns reports and indicators alike.
    pub fn tick(
        &mut self,
        now_ms: u32,
        io: &mut (impl InputPort + IndicatorPort),
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        self.poll_count += 1;

        // 1. Give the input stack its turn, then apply session changes
        io.update();
        while let Some(event) = io.next_session_event() {
            match event {
                SessionEvent::Connected { handle, is_gamepad } => {
                    self.connect(handle, is_gamepad, sink);
                }
                SessionEvent::Disconnected { handle } => {
                    self.disconnect(handle, now_ms, hw, sink);
                }
            }
        }

        // 2. Per-slot processing, in slot order
        let mut vanished: Vec<SessionHandle, MAX_CONTROLLERS> = Vec::new();
        for (index, handle) in self.slots.occupied() {
            let report = match io.read(handle) {
                Some(report) if report.connected => report,
                _ => {
                    // The stack forgot this session without a disconnect
                    // reaching us.
                    let _ = vanished.push(handle);
                    continue;
                }
            };
            if !report.is_usable() {
                continue;
            }
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            let update = slot.process(&report, now_ms, &self.config);
            self.apply_slot_update(index, handle, update, now_ms, io, hw, sink);
        }

        for handle in vanished {
            warn!("Controller {:?} vanished without a disconnect", handle);
            self.disconnect(handle, now_ms, hw, sink);
        }

        // 3. Merge standing intents (none without a controller)
        let intent = self.merged_intent();

        // 4. Outputs: main group first, then latched pouches, then motor
        if let Some(intent) = intent {
            self.valves
                .drive_main(intent.main, now_ms, &mut self.guard, hw, sink);
        }
        self.valves
            .service_pouches(now_ms, &mut self.guard, hw, sink);
        if let Some(intent) = intent {
            self.motor.apply(intent.motor, hw, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (session callback, supervisor, etc.).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Connect { handle, is_gamepad } => {
                self.connect(handle, is_gamepad, sink);
            }
            AppCommand::Disconnect(handle) => {
                self.disconnect(handle, now_ms, hw, sink);
            }
            AppCommand::ReleaseAll => {
                self.release_all("operator request", now_ms, hw, sink);
            }
            AppCommand::UpdateConfig(new_config) => match new_config.validate() {
                Ok(()) => {
                    self.guard.set_deadtime_ms(new_config.deadtime_ms);
                    self.config = new_config;
                    for (index, _) in self.slots.occupied() {
                        if let Some(slot) = self.slots.get_mut(index) {
                            slot.reconfigure(&self.config);
                        }
                    }
                    info!("Configuration updated at runtime");
                }
                Err(e) => warn!("Configuration rejected: {}", e),
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn main_valve(&self) -> MainValve {
        self.valves.main()
    }

    pub fn pouch_open(&self, section: Section, pouch: Pouch) -> bool {
        self.valves.pouch_open(section, pouch)
    }

    /// Command currently on the motor outputs.
    pub fn motor_command(&self) -> MotorCommand {
        self.motor.applied()
    }

    pub fn slot(&self, index: usize) -> Option<&ControllerSlot> {
        self.slots.get(index)
    }

    /// Occupied slot indices with their session handles.
    pub fn occupied_slots(&self) -> Vec<(usize, SessionHandle), MAX_CONTROLLERS> {
        self.slots.occupied()
    }

    /// Total poll cycles executed since startup.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn connect(&mut self, handle: SessionHandle, is_gamepad: bool, sink: &mut impl EventSink) {
        if !is_gamepad {
            warn!("Rejecting {:?}: not a gamepad", handle);
            sink.emit(&AppEvent::ControllerRejected {
                handle,
                reason: "not a gamepad",
            });
            return;
        }
        match self.slots.connect(handle, self.config.toggle_settle_ms) {
            Some(slot) => {
                info!("Controller {:?} connected in slot {}", handle, slot);
                sink.emit(&AppEvent::ControllerConnected { slot, handle });
            }
            None => {
                warn!("Rejecting {:?}: all {} slots taken", handle, MAX_CONTROLLERS);
                sink.emit(&AppEvent::ControllerRejected {
                    handle,
                    reason: "no free slot",
                });
            }
        }
    }

    fn disconnect(
        &mut self,
        handle: SessionHandle,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let Some((slot, _)) = self.slots.disconnect(handle) else {
            debug!("Ignoring disconnect for unknown {:?}", handle);
            return;
        };
        info!("Controller {:?} disconnected from slot {}", handle, slot);
        sink.emit(&AppEvent::ControllerDisconnected { slot, handle });

        if self.config.release_on_disconnect {
            self.release_all("controller disconnected", now_ms, hw, sink);
        }
    }

    /// Every valve off, motor stopped, all standing intents dropped.
    fn release_all(
        &mut self,
        reason: &'static str,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        self.valves.all_off(now_ms, &mut self.guard, hw, sink);
        self.motor.stop(hw, sink);
        for (index, _) in self.slots.occupied() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.clear_intent();
            }
        }
        warn!("All outputs released: {}", reason);
        sink.emit(&AppEvent::AllReleased { reason });
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_slot_update(
        &mut self,
        slot: usize,
        handle: SessionHandle,
        update: SlotUpdate,
        now_ms: u32,
        io: &mut impl IndicatorPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if let Some(mode) = update.mode_toggled {
            sink.emit(&AppEvent::ModeToggled { slot, mode });
        }
        if let Some(section) = update.section_toggled {
            sink.emit(&AppEvent::SectionToggled { slot, section });
        }
        if let Some(idle) = update.idle_changed {
            sink.emit(&AppEvent::IdleChanged { slot, idle });
        }
        if let Some(rgb) = update.indicator {
            io.set_indicator_color(handle, rgb);
            sink.emit(&AppEvent::IndicatorChanged { slot, rgb });
        }
        if let Some(active) = update.override_changed {
            sink.emit(&AppEvent::ExhaustOverride { slot, active });
        }

        for action in update.actions {
            match action {
                PouchAction::Open { section, pouch } => {
                    self.valves.request_pouch(section, pouch);
                }
                PouchAction::Release { section, pouch } => {
                    self.valves
                        .release_pouch(section, pouch, now_ms, &mut self.guard, hw, sink);
                }
                PouchAction::ReleaseExhaust => {
                    self.valves
                        .release_exhaust(now_ms, &mut self.guard, hw, sink);
                }
            }
        }
    }

    /// Combine every slot's standing intent into one target.
    ///
    /// `None` when no controller is connected: outputs then stay as last
    /// commanded.
    fn merged_intent(&self) -> Option<SlotIntent> {
        if self.slots.is_empty() {
            return None;
        }

        let mut wants_fill = false;
        let mut wants_exhaust = false;
        let mut motor = MotorCommand::STOP;

        for (index, _) in self.slots.occupied() {
            let Some(slot) = self.slots.get(index) else {
                continue;
            };
            let intent = slot.last_intent();
            match intent.main {
                MainValve::Fill => wants_fill = true,
                MainValve::Exhaust => wants_exhaust = true,
                MainValve::Hold => {}
            }
            if motor.is_stopped() && !intent.motor.is_stopped() {
                motor = intent.motor;
            }
        }

        let main = match (wants_fill, wants_exhaust) {
            (true, false) => MainValve::Fill,
            (false, true) => MainValve::Exhaust,
            _ => MainValve::Hold,
        };
        Some(SlotIntent { main, motor })
    }
}
