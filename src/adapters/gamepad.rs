//! Gamepad adapter — hand-off between the radio stack and the control loop.
//!
//! The radio/session stack runs in its own task and reports through
//! callbacks; the control loop polls.  [`GamepadFeed`] is the callback
//! side, [`QueuedGamepadInput`] the poll side, and both share one
//! mutex-guarded mailbox:
//!
//! ```text
//!  radio task ──▶ GamepadFeed ──▶ [ sessions · reports · indicators ] ──▶ QueuedGamepadInput ──▶ AppService
//!             ◀── take_indicator() ◀──────────────┘
//! ```
//!
//! Reports are "latest wins": the mailbox keeps one report per session
//! plus a fresh flag that a read clears.  Session events are queued in
//! order so a disconnect can never overtake its connect.
//!
//! On target the stack's C callbacks land in the `vinebot_gamepad_*`
//! hooks below.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use heapless::{Deque, Vec};
use log::{debug, warn};

use crate::app::ports::{IndicatorPort, InputPort};
use crate::control::selector::Rgb;
use crate::input::{GamepadReport, SessionEvent, SessionHandle};

/// Sessions the mailbox tracks at once (gamepads and anything else the
/// stack connects).
pub const MAX_SESSIONS: usize = 8;
const SESSION_QUEUE: usize = 16;
const INDICATOR_QUEUE: usize = 8;

#[derive(Default)]
struct Mailbox {
    sessions: Deque<SessionEvent, SESSION_QUEUE>,
    reports: Vec<(SessionHandle, GamepadReport), MAX_SESSIONS>,
    indicators: Deque<(SessionHandle, Rgb), INDICATOR_QUEUE>,
    dropped_events: u32,
}

impl Mailbox {
    fn push_session(&mut self, event: SessionEvent) {
        if self.sessions.push_back(event).is_err() {
            self.dropped_events = self.dropped_events.wrapping_add(1);
            warn!("gamepad: session queue full, dropped {:?}", event);
        }
    }

    /// A disconnect is never lost to a full queue.  If the matching connect
    /// is still pending the two cancel out; otherwise the oldest event
    /// makes room.
    fn push_disconnect(&mut self, handle: SessionHandle) {
        let event = SessionEvent::Disconnected { handle };
        if !self.sessions.is_full() {
            self.push_session(event);
            return;
        }

        let mut pending: Vec<SessionEvent, SESSION_QUEUE> =
            self.sessions.iter().copied().collect();
        let unseen_connect = pending
            .iter()
            .rposition(|e| matches!(e, SessionEvent::Connected { handle: h, .. } if *h == handle));
        self.sessions.clear();
        match unseen_connect {
            Some(pos) => {
                pending.remove(pos);
                debug!("gamepad: {:?} left before its connect was seen", handle);
            }
            None => {
                let evicted = pending.remove(0);
                self.dropped_events = self.dropped_events.wrapping_add(1);
                warn!("gamepad: session queue full, evicted {:?} for {:?}", evicted, event);
                let _ = pending.push(event);
            }
        }
        for e in pending {
            let _ = self.sessions.push_back(e);
        }
    }

    fn report_mut(&mut self, handle: SessionHandle) -> Option<&mut GamepadReport> {
        self.reports
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, r)| r)
    }
}

fn lock(mailbox: &Mutex<Mailbox>) -> MutexGuard<'_, Mailbox> {
    // A panicking producer cannot leave the mailbox half-written in a way
    // that matters: every field is a plain value.
    mailbox.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// Producer side (radio task)
// ───────────────────────────────────────────────────────────────

/// Callback-side handle.  Cheap to clone; every clone feeds the same loop.
#[derive(Clone, Default)]
pub struct GamepadFeed {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl GamepadFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll-side view onto this feed.
    pub fn input(&self) -> QueuedGamepadInput {
        QueuedGamepadInput {
            mailbox: Arc::clone(&self.mailbox),
        }
    }

    pub fn connected(&self, handle: SessionHandle, is_gamepad: bool) {
        let mut mb = lock(&self.mailbox);
        let report = GamepadReport {
            connected: true,
            is_gamepad,
            ..Default::default()
        };
        match mb.report_mut(handle) {
            Some(existing) => *existing = report,
            None => {
                if mb.reports.push((handle, report)).is_err() {
                    warn!("gamepad: {:?} connected but session table is full", handle);
                    return;
                }
            }
        }
        mb.push_session(SessionEvent::Connected { handle, is_gamepad });
    }

    pub fn disconnected(&self, handle: SessionHandle) {
        let mut mb = lock(&self.mailbox);
        let before = mb.reports.len();
        mb.reports.retain(|(h, _)| *h != handle);
        if mb.reports.len() == before {
            debug!("gamepad: disconnect for untracked {:?} ignored", handle);
            return;
        }
        mb.push_disconnect(handle);
    }

    /// Publish a decoded report; the fresh flag is set on the copy the
    /// mailbox keeps.
    pub fn publish(&self, handle: SessionHandle, report: GamepadReport) {
        let mut mb = lock(&self.mailbox);
        match mb.report_mut(handle) {
            Some(slot) => {
                *slot = GamepadReport {
                    connected: true,
                    has_fresh_data: true,
                    is_gamepad: slot.is_gamepad,
                    ..report
                };
            }
            None => debug!("gamepad: report for unknown {:?} dropped", handle),
        }
    }

    /// Next indicator colour the stack should send to a controller.
    pub fn take_indicator(&self) -> Option<(SessionHandle, Rgb)> {
        lock(&self.mailbox).indicators.pop_front()
    }

    /// Session events lost to a full queue since boot.
    pub fn dropped_events(&self) -> u32 {
        lock(&self.mailbox).dropped_events
    }
}

// ───────────────────────────────────────────────────────────────
// Consumer side (control loop)
// ───────────────────────────────────────────────────────────────

/// Poll-side adapter implementing [`InputPort`] and [`IndicatorPort`].
pub struct QueuedGamepadInput {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl InputPort for QueuedGamepadInput {
    fn update(&mut self) {
        // Cede the core so the radio task can deliver callbacks.
        std::thread::yield_now();
    }

    fn next_session_event(&mut self) -> Option<SessionEvent> {
        lock(&self.mailbox).sessions.pop_front()
    }

    fn read(&mut self, handle: SessionHandle) -> Option<GamepadReport> {
        let mut mb = lock(&self.mailbox);
        let report = mb.report_mut(handle)?;
        let snapshot = *report;
        report.has_fresh_data = false;
        Some(snapshot)
    }
}

impl IndicatorPort for QueuedGamepadInput {
    fn set_indicator_color(&mut self, handle: SessionHandle, rgb: Rgb) {
        let mut mb = lock(&self.mailbox);
        // A stale colour for the same controller is superseded.
        let pending: Vec<(SessionHandle, Rgb), INDICATOR_QUEUE> = mb
            .indicators
            .iter()
            .copied()
            .filter(|(h, _)| *h != handle)
            .collect();
        mb.indicators.clear();
        for entry in pending {
            let _ = mb.indicators.push_back(entry);
        }
        if mb.indicators.push_back((handle, rgb)).is_err() {
            warn!("gamepad: indicator queue full, {:?} dropped", handle);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// C hooks for the radio stack (target only)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static FEED: std::sync::OnceLock<GamepadFeed> = std::sync::OnceLock::new();

/// Register the feed the C hooks publish into.  Call once at boot.
#[cfg(target_os = "espidf")]
pub fn install(feed: &GamepadFeed) -> bool {
    FEED.set(feed.clone()).is_ok()
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn vinebot_gamepad_connected(handle: u32, is_gamepad: bool) {
    if let Some(feed) = FEED.get() {
        feed.connected(SessionHandle(handle), is_gamepad);
    }
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn vinebot_gamepad_disconnected(handle: u32) {
    if let Some(feed) = FEED.get() {
        feed.disconnected(SessionHandle(handle));
    }
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn vinebot_gamepad_report(
    handle: u32,
    buttons: u16,
    dpad: u8,
    trigger_a: u16,
    trigger_b: u16,
) {
    if let Some(feed) = FEED.get() {
        feed.publish(
            SessionHandle(handle),
            GamepadReport {
                buttons,
                dpad,
                trigger_a,
                trigger_b,
                ..Default::default()
            },
        );
    }
}

/// Pop the next indicator write.  Returns `false` when none is pending.
///
/// # Safety
///
/// `handle` and `rgb` must be valid for writes; `rgb` must point to three
/// bytes.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vinebot_gamepad_take_indicator(handle: *mut u32, rgb: *mut u8) -> bool {
    let Some((h, (r, g, b))) = FEED.get().and_then(GamepadFeed::take_indicator) else {
        return false;
    };
    // SAFETY: caller guarantees both pointers are writable (see above).
    unsafe {
        *handle = h.0;
        *rgb = r;
        *rgb.add(1) = g;
        *rgb.add(2) = b;
    }
    true
}
