//! Mode / section selector and indicator colour lookup.
//!
//! Two independent binary flags per controller, each flipped by the rising
//! edge of its own button.  The `(mode, section)` pair selects one of four
//! indicator colours; while the controller is idle the indicator shows a
//! fixed neutral colour instead.

use serde::{Deserialize, Serialize};

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// Pouch-button bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Pouch buttons open their pouch valve.
    #[default]
    FillBias,
    /// Pouch buttons divert to the main exhaust.
    ExhaustBias,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::FillBias => Self::ExhaustBias,
            Self::ExhaustBias => Self::FillBias,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Which pouch bank receives button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Section {
    #[default]
    One,
    Two,
}

impl Section {
    pub fn toggled(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Fixed 2×2 colour table plus the idle override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPalette {
    /// Indexed `[mode][section]`.
    pub table: [[Rgb; 2]; 2],
    pub idle: Rgb,
}

impl Default for IndicatorPalette {
    fn default() -> Self {
        Self {
            table: [
                [(0, 255, 0), (0, 255, 255)], // fill-bias: green, cyan
                [(255, 0, 0), (255, 0, 255)], // exhaust-bias: red, magenta
            ],
            idle: (32, 32, 32),
        }
    }
}

impl IndicatorPalette {
    pub fn colour(&self, mode: Mode, section: Section) -> Rgb {
        self.table[mode.index()][section.index()]
    }

    pub fn is_distinct(&self) -> bool {
        let all = [
            self.table[0][0],
            self.table[0][1],
            self.table[1][0],
            self.table[1][1],
            self.idle,
        ];
        all.iter()
            .enumerate()
            .all(|(i, c)| all[i + 1..].iter().all(|other| other != c))
    }
}

/// Per-controller selector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeSelector {
    pub mode: Mode,
    pub section: Section,
}

impl ModeSelector {
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn toggle_section(&mut self) -> Section {
        self.section = self.section.toggled();
        self.section
    }

    /// Colour the indicator should show right now.
    pub fn indicator(&self, palette: &IndicatorPalette, idle: bool) -> Rgb {
        if idle {
            palette.idle
        } else {
            palette.colour(self.mode, self.section)
        }
    }
}
