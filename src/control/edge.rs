//! Edge detection for controller inputs.
//!
//! Controller bits arrive already debounced by the input stack, so the
//! default settle window is zero and [`EdgeDetector`] degrades to a plain
//! previous/current comparator: one edge per physical press, no masking of
//! legitimate rapid presses.  A non-zero window turns it into a classic
//! settle-time debouncer for raw inputs.

/// A transition of a boolean input that has become stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Settle-window edge detector for one boolean input.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    settle_ms: u32,
    stable: bool,
    candidate: bool,
    candidate_since_ms: u32,
}

impl EdgeDetector {
    pub const fn new(settle_ms: u32) -> Self {
        Self::with_initial(settle_ms, false)
    }

    pub const fn with_initial(settle_ms: u32, initial: bool) -> Self {
        Self {
            settle_ms,
            stable: initial,
            candidate: initial,
            candidate_since_ms: 0,
        }
    }

    /// Feed one sample.  Returns an edge when the stable value changes.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<Edge> {
        if self.settle_ms == 0 {
            return self.commit(raw);
        }

        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since_ms = now_ms;
            return None;
        }

        if now_ms.wrapping_sub(self.candidate_since_ms) >= self.settle_ms {
            self.commit(raw)
        } else {
            None
        }
    }

    /// Last stable value.
    pub fn is_high(&self) -> bool {
        self.stable
    }

    /// Forget history and settle on `value` without reporting an edge.
    pub fn reset(&mut self, value: bool) {
        self.stable = value;
        self.candidate = value;
    }

    /// Change the settle window, keeping the stable value.  A change
    /// still settling restarts under the new window.
    pub fn set_settle_ms(&mut self, settle_ms: u32) {
        self.settle_ms = settle_ms;
        self.candidate = self.stable;
    }

    fn commit(&mut self, value: bool) -> Option<Edge> {
        self.candidate = value;
        if value == self.stable {
            return None;
        }
        self.stable = value;
        Some(if value { Edge::Rising } else { Edge::Falling })
    }
}

/// Press/release bits between two button-bitmask snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonEdges {
    pub pressed: u16,
    pub released: u16,
}

impl ButtonEdges {
    pub fn between(previous: u16, current: u16) -> Self {
        Self {
            pressed: current & !previous,
            released: previous & !current,
        }
    }

    pub fn pressed(&self, mask: u16) -> bool {
        self.pressed & mask != 0
    }

    pub fn released(&self, mask: u16) -> bool {
        self.released & mask != 0
    }
}
