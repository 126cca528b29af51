//! Controller slots — per-controller state with an explicit lifecycle.
//!
//! A [`ControllerSlot`] is created (with defaults) when the input stack
//! reports a connect, updated once per poll from that controller's
//! report, and dropped on disconnect.  Nothing about a controller lives
//! outside its slot, so slots never share state and need no locking.
//!
//! [`ControllerSlot::process`] is pure: it turns one report into a
//! [`SlotUpdate`] (toggles, indicator, pouch actions, and the standing
//! main-valve/motor intent).  The service applies it to the hardware.

use heapless::Vec;
use log::debug;

use crate::config::{ControllerConfig, MAX_CONTROLLERS};
use crate::control::edge::{ButtonEdges, Edge, EdgeDetector};
use crate::control::motor::{self, MotorCommand, TriggerDirection, TriggerScale};
use crate::control::selector::{Mode, ModeSelector, Rgb, Section};
use crate::control::valves::{MainValve, Pouch, POUCH_COUNT};
use crate::input::{dpad, GamepadReport, SessionHandle};

// ───────────────────────────────────────────────────────────────
// Per-poll output of a slot
// ───────────────────────────────────────────────────────────────

/// Level-driven requests a slot holds until its next fresh report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotIntent {
    pub main: MainValve,
    pub motor: MotorCommand,
}

/// Edge-driven pouch work produced by one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PouchAction {
    /// Latch an open request for this pouch.
    Open { section: Section, pouch: Pouch },
    /// Close this pouch immediately.
    Release { section: Section, pouch: Pouch },
    /// Drop an energised main EXHAUST immediately.
    ReleaseExhaust,
}

/// Everything one report changed on a slot.
#[derive(Debug, Clone, Default)]
pub struct SlotUpdate {
    pub mode_toggled: Option<Mode>,
    pub section_toggled: Option<Section>,
    pub idle_changed: Option<bool>,
    /// Indicator colour to write, if it needs rewriting.
    pub indicator: Option<Rgb>,
    pub override_changed: Option<bool>,
    pub actions: Vec<PouchAction, { 3 * POUCH_COUNT }>,
    pub intent: SlotIntent,
}

// ───────────────────────────────────────────────────────────────
// ControllerSlot
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControllerSlot {
    handle: SessionHandle,
    selector: ModeSelector,
    previous_buttons: u16,
    mode_button: EdgeDetector,
    section_button: EdgeDetector,
    idle: EdgeDetector,
    last_trigger_direction: TriggerDirection,
    /// Pouch buttons currently holding the exhaust override, bit per [`Pouch`].
    override_holders: u8,
    last_intent: SlotIntent,
    indicator_pending: bool,
}

impl ControllerSlot {
    pub fn new(handle: SessionHandle, toggle_settle_ms: u32) -> Self {
        Self {
            handle,
            selector: ModeSelector::default(),
            previous_buttons: 0,
            mode_button: EdgeDetector::new(toggle_settle_ms),
            section_button: EdgeDetector::new(toggle_settle_ms),
            idle: EdgeDetector::new(0),
            last_trigger_direction: TriggerDirection::None,
            override_holders: 0,
            last_intent: SlotIntent::default(),
            indicator_pending: true,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn mode(&self) -> Mode {
        self.selector.mode
    }

    pub fn section(&self) -> Section {
        self.selector.section
    }

    pub fn is_idle(&self) -> bool {
        self.idle.is_high()
    }

    pub fn exhaust_override(&self) -> bool {
        self.override_holders != 0
    }

    pub fn last_trigger_direction(&self) -> TriggerDirection {
        self.last_trigger_direction
    }

    /// Intent from the most recent fresh report.
    pub fn last_intent(&self) -> SlotIntent {
        self.last_intent
    }

    /// Forget the standing intent and any latched override.
    ///
    /// Button history is kept, so a still-held button does not produce a
    /// fresh press edge afterwards.
    pub fn clear_intent(&mut self) {
        self.last_intent = SlotIntent::default();
        self.last_trigger_direction = TriggerDirection::None;
        self.override_holders = 0;
    }

    /// Adopt a new configuration: toggle buttons take the new settle
    /// window and the indicator is rewritten on the next fresh report.
    pub fn reconfigure(&mut self, config: &ControllerConfig) {
        self.mode_button.set_settle_ms(config.toggle_settle_ms);
        self.section_button.set_settle_ms(config.toggle_settle_ms);
        self.indicator_pending = true;
    }

    /// Digest one fresh report.
    pub fn process(
        &mut self,
        report: &GamepadReport,
        now_ms: u32,
        config: &ControllerConfig,
    ) -> SlotUpdate {
        let map = &config.buttons;
        let mut update = SlotUpdate::default();

        // ── Mode / section toggles (rising edge only) ────────
        if self.mode_button.update(report.held(map.mode_toggle), now_ms) == Some(Edge::Rising) {
            update.mode_toggled = Some(self.selector.toggle_mode());
        }
        if self.section_button.update(report.held(map.section_toggle), now_ms)
            == Some(Edge::Rising)
        {
            update.section_toggled = Some(self.selector.toggle_section());
        }

        // ── Idle detection ───────────────────────────────────
        update.idle_changed = self
            .idle
            .update(report.is_idle(), now_ms)
            .map(|edge| edge == Edge::Rising);

        if self.indicator_pending
            || update.mode_toggled.is_some()
            || update.section_toggled.is_some()
            || update.idle_changed.is_some()
        {
            update.indicator = Some(self.selector.indicator(&config.palette, self.is_idle()));
            self.indicator_pending = false;
        }

        // ── Pouch buttons (active section only) ─────────────
        let edges = ButtonEdges::between(self.previous_buttons, report.buttons);
        let section = self.selector.section;
        let divert =
            report.held(map.exhaust_modifier) || self.selector.mode == Mode::ExhaustBias;
        let had_override = self.exhaust_override();

        for pouch in Pouch::ALL {
            let mask = map.pouches[pouch.index()];
            let bit = 1u8 << pouch.index();
            if edges.pressed(mask) {
                if divert {
                    self.override_holders |= bit;
                } else {
                    // Capacity covers the worst case of three actions per pouch.
                    let _ = update.actions.push(PouchAction::Open { section, pouch });
                }
            }
            if edges.released(mask) {
                self.override_holders &= !bit;
                let _ = update.actions.push(PouchAction::Release { section, pouch });
                let _ = update.actions.push(PouchAction::ReleaseExhaust);
            }
        }
        self.previous_buttons = report.buttons;

        if self.exhaust_override() != had_override {
            update.override_changed = Some(self.exhaust_override());
        }

        // ── Level-driven intent ──────────────────────────────
        let main = if self.exhaust_override() {
            MainValve::Exhaust
        } else {
            main_from_dpad(report.dpad)
        };
        let scale = TriggerScale {
            noise_threshold: config.trigger_noise_threshold,
            max: config.trigger_max,
        };
        let motor = motor::resolve(
            report.trigger_a,
            report.trigger_b,
            &mut self.last_trigger_direction,
            &scale,
        );

        update.intent = SlotIntent { main, motor };
        self.last_intent = update.intent;
        update
    }
}

/// D-pad up only → FILL, down only → EXHAUST, anything else → HOLD.
pub fn main_from_dpad(bits: u8) -> MainValve {
    match (bits & dpad::UP != 0, bits & dpad::DOWN != 0) {
        (true, false) => MainValve::Fill,
        (false, true) => MainValve::Exhaust,
        _ => MainValve::Hold,
    }
}

// ───────────────────────────────────────────────────────────────
// SlotRegistry
// ───────────────────────────────────────────────────────────────

/// Fixed-size slot table indexed by slot number.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: [Option<ControllerSlot>; MAX_CONTROLLERS],
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to a slot, resetting it to defaults.
    ///
    /// A handle that is already bound keeps its slot number but starts
    /// over.  Returns `None` when every slot is taken.
    pub fn connect(&mut self, handle: SessionHandle, toggle_settle_ms: u32) -> Option<usize> {
        let index = self
            .find(handle)
            .or_else(|| self.slots.iter().position(Option::is_none))?;
        self.slots[index] = Some(ControllerSlot::new(handle, toggle_settle_ms));
        debug!("slots: {:?} -> slot {}", handle, index);
        Some(index)
    }

    /// Free the slot bound to `handle`.
    pub fn disconnect(&mut self, handle: SessionHandle) -> Option<(usize, ControllerSlot)> {
        let index = self.find(handle)?;
        self.slots[index].take().map(|slot| (index, slot))
    }

    pub fn find(&self, handle: SessionHandle) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.handle == handle))
    }

    pub fn get(&self, index: usize) -> Option<&ControllerSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ControllerSlot> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Occupied slot indices with their session handles, in slot order.
    pub fn occupied(&self) -> Vec<(usize, SessionHandle), MAX_CONTROLLERS> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s.handle)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
