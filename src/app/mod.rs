//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the control rules for the VineBot apparatus:
//! controller slot lifecycle, per-poll orchestration, and intent merging.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod slots;
