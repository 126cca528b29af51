//! VineBot firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod input;
pub mod pins;
pub mod safety;

// Hardware-facing modules compile on the host as thin no-op shims; the
// real implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;

#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("building for ESP-IDF requires the `espidf` feature");
