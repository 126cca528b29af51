//! Task watchdog for the control loop.
//!
//! Panics (and so resets) the chip when the loop stops polling.  All output
//! pins come up LOW after the reset, so a wedged loop cannot leave a
//! solenoid energised.
//!
//! Feed once per poll; [`ControllerConfig::validate`] guarantees the
//! timeout is longer than the poll interval.
//!
//! [`ControllerConfig::validate`]: crate::config::ControllerConfig::validate

use log::{info, warn};

/// Whether the calling task ended up subscribed to the TWDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Armed,
    /// Subscription failed with this `esp_err_t`; feeding is a no-op.
    Unavailable(i32),
    /// Host build: nothing to arm.
    Simulated,
}

pub struct Watchdog {
    timeout_ms: u32,
    state: WatchdogState,
}

impl Watchdog {
    /// Reconfigure the TWDT to `timeout_ms` and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        let state = arm(timeout_ms);
        match state {
            WatchdogState::Armed => info!("Watchdog armed: {}ms, panic on expiry", timeout_ms),
            WatchdogState::Unavailable(rc) => warn!("Watchdog not armed (esp_err {})", rc),
            WatchdogState::Simulated => info!("Watchdog(sim): {}ms, not armed", timeout_ms),
        }
        Self { timeout_ms, state }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn feed(&self) {
        if self.state == WatchdogState::Armed {
            reset();
        }
    }
}

#[cfg(target_os = "espidf")]
fn arm(timeout_ms: u32) -> WatchdogState {
    use esp_idf_svc::sys::{
        esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, ESP_OK,
    };

    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: called once from the main task during boot; `cfg` outlives the call.
    let rc = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if rc != ESP_OK {
        // The bootloader may already have configured it; subscribing still works.
        warn!("TWDT reconfigure returned {}", rc);
    }
    // SAFETY: a null handle subscribes the calling task.
    let rc = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if rc == ESP_OK {
        WatchdogState::Armed
    } else {
        WatchdogState::Unavailable(rc)
    }
}

#[cfg(not(target_os = "espidf"))]
fn arm(_timeout_ms: u32) -> WatchdogState {
    WatchdogState::Simulated
}

#[cfg(target_os = "espidf")]
fn reset() {
    // SAFETY: only reached from the task that subscribed in `arm`.
    unsafe {
        esp_idf_svc::sys::esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn reset() {}
