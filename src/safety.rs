//! Output guard — the apparatus-wide valve dead-time interlock.
//!
//! All solenoids share one air supply, so the guard keeps a **single**
//! last-write timestamp for the whole apparatus rather than one per valve.
//! Any state-changing valve write is stamped here.
//!
//! ## Write policy
//!
//! 1. Energising writes ask [`OutputGuard::permits`] first.  A `false`
//!    is not an error: the caller leaves the outputs untouched and retries
//!    on the next poll, which naturally coalesces with the dead-time.
//! 2. De-energising writes (pouch release, exhaust-override release,
//!    disconnect shutdown) are always honoured immediately, but still
//!    [`record`](OutputGuard::record) so the *next* energising write waits
//!    a full window.
//! 3. Requesting the state a valve is already in is a no-op: it is
//!    accepted without touching the timestamp.
//!
//! The check and the mutation are separate calls, so a loop that must stay
//! responsive never sleeps inside the guard.

use log::debug;

/// Shared dead-time interlock.
#[derive(Debug, Clone, Copy)]
pub struct OutputGuard {
    deadtime_ms: u32,
    /// `None` until the first valve write after boot.
    last_write_ms: Option<u32>,
}

impl OutputGuard {
    pub fn new(deadtime_ms: u32) -> Self {
        Self {
            deadtime_ms,
            last_write_ms: None,
        }
    }

    pub fn deadtime_ms(&self) -> u32 {
        self.deadtime_ms
    }

    pub fn set_deadtime_ms(&mut self, deadtime_ms: u32) {
        self.deadtime_ms = deadtime_ms;
    }

    /// Pure predicate: has a full dead-time elapsed since the last write?
    pub fn permits(&self, now_ms: u32) -> bool {
        match self.last_write_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.deadtime_ms,
        }
    }

    /// Stamp a state-changing valve write.
    pub fn record(&mut self, now_ms: u32) {
        self.last_write_ms = Some(now_ms);
    }

    /// Check-and-record for a guarded transition.
    ///
    /// Returns `true` when the caller may apply `desired` (or when it
    /// already equals `current`, in which case nothing is recorded).
    pub fn try_write<S: PartialEq + core::fmt::Debug>(
        &mut self,
        current: S,
        desired: S,
        now_ms: u32,
    ) -> bool {
        if current == desired {
            return true;
        }
        if !self.permits(now_ms) {
            debug!(
                "guard: {:?} -> {:?} deferred ({} ms left)",
                current,
                desired,
                self.remaining_ms(now_ms)
            );
            return false;
        }
        self.record(now_ms);
        true
    }

    /// Time until the next energising write would be permitted.
    pub fn remaining_ms(&self, now_ms: u32) -> u32 {
        match self.last_write_ms {
            None => 0,
            Some(last) => self.deadtime_ms.saturating_sub(now_ms.wrapping_sub(last)),
        }
    }

    pub fn last_write_ms(&self) -> Option<u32> {
        self.last_write_ms
    }
}
