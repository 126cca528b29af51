//! Valve driver — main fill/exhaust group and the two pouch banks.
//!
//! ```text
//!            FILL ◀──┐          ┌──▶ EXHAUST
//!                    │   HOLD   │
//!                    └──(both)──┘
//!                        off
//! ```
//!
//! The main group never energises FILL and EXHAUST together.  A direct
//! FILL↔EXHAUST request is split: the first accepted write drops to HOLD,
//! and the opposing line is only energised on a later poll once another
//! full dead-time has passed.  Within a single write the energised line is
//! always switched off before the other one is switched on.
//!
//! Pouch valves are single-line ON/OFF.  Opening is guarded and latched
//! (retried every poll until accepted); closing is immediate.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};
use crate::control::selector::Section;
use crate::pins::OutputLine;
use crate::safety::OutputGuard;

pub const POUCH_COUNT: usize = 3;

/// One of the three pouch valves in a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pouch {
    Left,
    Right,
    Top,
}

impl Pouch {
    pub const ALL: [Self; POUCH_COUNT] = [Self::Left, Self::Right, Self::Top];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Logical state of the main valve group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainValve {
    /// Both lines off.
    #[default]
    Hold,
    Fill,
    Exhaust,
}

impl MainValve {
    fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Fill, Self::Exhaust) | (Self::Exhaust, Self::Fill)
        )
    }
}

/// Physical state of every valve on the apparatus.
#[derive(Debug, Clone, Default)]
pub struct ValveBank {
    main: MainValve,
    /// Energised pouch lines, `[section][pouch]`.
    open: [[bool; POUCH_COUNT]; 2],
    /// Latched open requests waiting on the guard.
    requested: [[bool; POUCH_COUNT]; 2],
}

impl ValveBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main(&self) -> MainValve {
        self.main
    }

    pub fn pouch_open(&self, section: Section, pouch: Pouch) -> bool {
        self.open[section.index()][pouch.index()]
    }

    pub fn pouch_requested(&self, section: Section, pouch: Pouch) -> bool {
        self.requested[section.index()][pouch.index()]
    }

    // ── Main group ────────────────────────────────────────────

    /// Move the main group toward `target` through the guard.
    ///
    /// A deferred write is retried by calling again on a later poll;
    /// FILL and EXHAUST swap through an intermediate HOLD.
    pub fn drive_main(
        &mut self,
        target: MainValve,
        now_ms: u32,
        guard: &mut OutputGuard,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if target == self.main {
            return;
        }

        let next = if self.main.opposes(target) {
            MainValve::Hold
        } else {
            target
        };

        if guard.try_write(self.main, next, now_ms) {
            self.set_main(next, hw, sink);
        }
    }

    /// Drop an energised EXHAUST to HOLD without consulting the guard.
    pub fn release_exhaust(
        &mut self,
        now_ms: u32,
        guard: &mut OutputGuard,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if self.main == MainValve::Exhaust {
            self.set_main(MainValve::Hold, hw, sink);
            guard.record(now_ms);
        }
    }

    fn set_main(
        &mut self,
        next: MainValve,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        // De-energise before energise.
        match next {
            MainValve::Hold => {
                hw.set_digital_output(OutputLine::MainFill, false);
                hw.set_digital_output(OutputLine::MainExhaust, false);
            }
            MainValve::Fill => {
                hw.set_digital_output(OutputLine::MainExhaust, false);
                hw.set_digital_output(OutputLine::MainFill, true);
            }
            MainValve::Exhaust => {
                hw.set_digital_output(OutputLine::MainFill, false);
                hw.set_digital_output(OutputLine::MainExhaust, true);
            }
        }
        sink.emit(&AppEvent::MainValveChanged {
            from: self.main,
            to: next,
        });
        self.main = next;
    }

    // ── Pouch banks ───────────────────────────────────────────

    /// Latch an open request; applied by [`service_pouches`](Self::service_pouches).
    pub fn request_pouch(&mut self, section: Section, pouch: Pouch) {
        self.requested[section.index()][pouch.index()] = true;
    }

    /// Try to open every latched pouch that is still closed.
    ///
    /// Stops at the first deferral: the shared dead-time means no other
    /// pouch could be accepted this poll either.
    pub fn service_pouches(
        &mut self,
        now_ms: u32,
        guard: &mut OutputGuard,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        for section in [Section::One, Section::Two] {
            for pouch in Pouch::ALL {
                let (s, p) = (section.index(), pouch.index());
                if !self.requested[s][p] || self.open[s][p] {
                    continue;
                }
                if !guard.try_write(false, true, now_ms) {
                    return;
                }
                hw.set_digital_output(OutputLine::Pouch { section, pouch }, true);
                self.open[s][p] = true;
                sink.emit(&AppEvent::PouchChanged {
                    section,
                    pouch,
                    open: true,
                });
            }
        }
    }

    /// Close a pouch and drop its latch.  Never deferred.
    pub fn release_pouch(
        &mut self,
        section: Section,
        pouch: Pouch,
        now_ms: u32,
        guard: &mut OutputGuard,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let (s, p) = (section.index(), pouch.index());
        self.requested[s][p] = false;
        if !self.open[s][p] {
            debug!("valves: release of closed pouch {:?}/{:?}", section, pouch);
            return;
        }
        hw.set_digital_output(OutputLine::Pouch { section, pouch }, false);
        self.open[s][p] = false;
        guard.record(now_ms);
        sink.emit(&AppEvent::PouchChanged {
            section,
            pouch,
            open: false,
        });
    }

    // ── Whole apparatus ───────────────────────────────────────

    /// De-energise every valve and clear all latches.  Never deferred.
    pub fn all_off(
        &mut self,
        now_ms: u32,
        guard: &mut OutputGuard,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let mut changed = false;
        if self.main != MainValve::Hold {
            self.set_main(MainValve::Hold, hw, sink);
            changed = true;
        }
        for section in [Section::One, Section::Two] {
            for pouch in Pouch::ALL {
                let (s, p) = (section.index(), pouch.index());
                self.requested[s][p] = false;
                if self.open[s][p] {
                    hw.set_digital_output(OutputLine::Pouch { section, pouch }, false);
                    self.open[s][p] = false;
                    changed = true;
                    sink.emit(&AppEvent::PouchChanged {
                        section,
                        pouch,
                        open: false,
                    });
                }
            }
        }
        if changed {
            guard.record(now_ms);
        }
    }
}
