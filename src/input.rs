//! Normalised gamepad input — the boundary with the wireless input stack.
//!
//! The radio stack discovers, pairs, and decodes controllers; by the time
//! a report reaches this crate it has been reduced to a button bitmask, a
//! D-pad bitmask, and two analog trigger magnitudes (0 – 1023).

use serde::{Deserialize, Serialize};

/// Opaque session handle issued by the input stack on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u32);

/// Connection lifecycle notifications from the input stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { handle: SessionHandle, is_gamepad: bool },
    Disconnected { handle: SessionHandle },
}

/// One poll's worth of controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GamepadReport {
    pub connected: bool,
    /// The stack delivered a new report since the previous poll.
    pub has_fresh_data: bool,
    pub buttons: u16,
    pub dpad: u8,
    /// Left analog trigger (0 – 1023).
    pub trigger_a: u16,
    /// Right analog trigger (0 – 1023).
    pub trigger_b: u16,
    pub is_gamepad: bool,
}

impl GamepadReport {
    /// No buttons and no D-pad direction held.
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.dpad == 0
    }

    /// Report carries usable controller data this poll.
    pub fn is_usable(&self) -> bool {
        self.connected && self.has_fresh_data && self.is_gamepad
    }

    pub fn held(&self, mask: u16) -> bool {
        self.buttons & mask != 0
    }
}

// ---------------------------------------------------------------------------
// Button bits (gamepad-class layout)
// ---------------------------------------------------------------------------

pub mod buttons {
    pub const A: u16 = 0x0001;
    pub const B: u16 = 0x0002;
    pub const X: u16 = 0x0004;
    pub const Y: u16 = 0x0008;
    pub const L1: u16 = 0x0010;
    pub const R1: u16 = 0x0020;
    pub const L2: u16 = 0x0040;
    pub const R2: u16 = 0x0080;
    pub const THUMB_L: u16 = 0x0100;
    pub const THUMB_R: u16 = 0x0200;
}

pub mod dpad {
    pub const UP: u8 = 0x01;
    pub const DOWN: u8 = 0x02;
    pub const RIGHT: u8 = 0x04;
    pub const LEFT: u8 = 0x08;
}

/// Which button drives which function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMap {
    pub mode_toggle: u16,
    pub section_toggle: u16,
    /// Held while pressing a pouch button to divert the press to the main
    /// exhaust instead.
    pub exhaust_modifier: u16,
    /// LEFT / RIGHT / TOP pouch buttons, indexed by
    /// [`Pouch`](crate::control::valves::Pouch).
    pub pouches: [u16; 3],
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            mode_toggle: buttons::L1,
            section_toggle: buttons::R1,
            exhaust_modifier: buttons::A,
            pouches: [buttons::X, buttons::B, buttons::Y],
        }
    }
}

impl ButtonMap {
    pub fn all(&self) -> [u16; 6] {
        [
            self.mode_toggle,
            self.section_toggle,
            self.exhaust_modifier,
            self.pouches[0],
            self.pouches[1],
            self.pouches[2],
        ]
    }
}
