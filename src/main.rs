//! VineBot Firmware — Main Entry Point
//!
//! Hexagonal composition root and polling control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  QueuedGamepadInput   HardwareAdapter   LogEventSink  Clock    │
//! │  (Input+Indicator)    (Actuator)        (EventSink)   (Clock)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Slots · Valves · Motor · Output guard                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Radio stack task ──▶ GamepadFeed (C hooks)                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use vinebot::adapters::gamepad::{self, GamepadFeed};
use vinebot::adapters::hardware::HardwareAdapter;
use vinebot::adapters::log_sink::LogEventSink;
use vinebot::adapters::time::MonotonicClock;
use vinebot::app::ports::ClockPort;
use vinebot::app::service::AppService;
use vinebot::config::ControllerConfig;
use vinebot::drivers::hw_init;
use vinebot::drivers::outputs::{GpioLine, LedcChannel};
use vinebot::drivers::watchdog::Watchdog;
use vinebot::pins::{OutputLine, PwmChannel};

/// Optional JSON config baked in at build time; unset fields keep defaults.
const BOOT_CONFIG: Option<&str> = option_env!("VINEBOT_CONFIG_JSON");

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  VineBot v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = match BOOT_CONFIG {
        Some(json) => ControllerConfig::from_json(json).context("boot config rejected")?,
        None => ControllerConfig::default(),
    };
    config.validate().context("boot config invalid")?;
    info!(
        "Config: deadtime={}ms poll={}ms release_on_disconnect={}",
        config.deadtime_ms, config.poll_interval_ms, config.release_on_disconnect
    );

    // ── 3. Peripherals (every output LOW before anything else) ─
    hw_init::init_peripherals().context("peripheral init failed")?;
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    let mut hw = HardwareAdapter::new(
        OutputLine::all().map(GpioLine::new),
        LedcChannel::new(PwmChannel::Motor),
    );

    // ── 4. Input hand-off with the radio stack ────────────────
    let feed = GamepadFeed::new();
    if !gamepad::install(&feed) {
        warn!("Gamepad feed already installed");
    }
    let mut input = feed.input();

    // ── 5. Application core ───────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let poll = Duration::from_millis(u64::from(config.poll_interval_ms));
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let mut reported_failures = 0;
    let mut reported_drops = 0;
    loop {
        app.tick(clock.now_millis(), &mut input, &mut hw, &mut sink);
        watchdog.feed();

        if hw.write_failures() != reported_failures {
            reported_failures = hw.write_failures();
            warn!(
                "Output driver failures: {} (last: {:?})",
                reported_failures,
                hw.last_error()
            );
        }

        if feed.dropped_events() != reported_drops {
            reported_drops = feed.dropped_events();
            warn!("Gamepad session events lost: {}", reported_drops);
        }

        std::thread::sleep(poll);
    }
}
