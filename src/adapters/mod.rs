//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                | Connects to                 |
//! |------------|---------------------------|-----------------------------|
//! | `gamepad`  | InputPort, IndicatorPort  | Radio/session stack (C)     |
//! | `hardware` | ActuatorPort              | embedded-hal pins + PWM     |
//! | `log_sink` | EventSink                 | Serial log output           |
//! | `time`     | ClockPort                 | ESP32 system timer          |

pub mod gamepad;
pub mod hardware;
pub mod log_sink;
pub mod time;
