//! System configuration parameters
//!
//! All tunable parameters for the VineBot controller.  Nothing here is
//! persisted: the apparatus boots with [`ControllerConfig::default`] or a
//! JSON literal baked into the image, and every field resets on power-up.

use serde::{Deserialize, Serialize};

use crate::control::selector::IndicatorPalette;
use crate::error::{Error, Result};
use crate::input::ButtonMap;

/// Upper bound on connected controllers (fixed slot table).
pub const MAX_CONTROLLERS: usize = 4;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Valves ---
    /// Minimum time between two state-changing valve writes (milliseconds)
    pub deadtime_ms: u32,

    // --- Triggers / motor ---
    /// Trigger magnitude at or below which a trigger counts as released
    pub trigger_noise_threshold: u16,
    /// Full-scale trigger magnitude reported by the input stack
    pub trigger_max: u16,

    // --- Inputs ---
    /// Settle window for toggle buttons (0 = plain edge comparator)
    pub toggle_settle_ms: u32,
    pub buttons: ButtonMap,
    pub palette: IndicatorPalette,

    // --- Safety ---
    /// De-energise every valve and stop the motor when a controller
    /// disconnects
    pub release_on_disconnect: bool,

    // --- Timing ---
    /// Control loop poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Task watchdog timeout; a stalled loop resets the board (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Valves
            deadtime_ms: 50,

            // Triggers
            trigger_noise_threshold: 10,
            trigger_max: 1023,

            // Inputs
            toggle_settle_ms: 0,
            buttons: ButtonMap::default(),
            palette: IndicatorPalette::default(),

            // Safety
            release_on_disconnect: true,

            // Timing
            poll_interval_ms: 5, // 200 Hz
            watchdog_timeout_ms: 2_000,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed config JSON"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.deadtime_ms == 0 {
            return Err(Error::Config("deadtime_ms must be non-zero"));
        }
        if self.deadtime_ms > 1000 {
            return Err(Error::Config("deadtime_ms above 1000"));
        }
        if self.trigger_max == 0 {
            return Err(Error::Config("trigger_max must be non-zero"));
        }
        if self.trigger_noise_threshold >= self.trigger_max {
            return Err(Error::Config("trigger_noise_threshold must be below trigger_max"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero"));
        }
        if self.watchdog_timeout_ms <= self.poll_interval_ms {
            return Err(Error::Config("watchdog_timeout_ms must exceed poll_interval_ms"));
        }

        let bits = self.buttons.all();
        if bits.iter().any(|b| b.count_ones() != 1) {
            return Err(Error::Config("button map entries must be single bits"));
        }
        let combined = bits.iter().fold(0u16, |acc, b| acc | b);
        if combined.count_ones() as usize != bits.len() {
            return Err(Error::Config("button map entries must be distinct"));
        }
        Ok(())
    }
}
