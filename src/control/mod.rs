//! Actuator control core: edge detection, mode/section selection, valve
//! and motor drivers.  Pure logic; outputs leave through
//! [`ActuatorPort`](crate::app::ports::ActuatorPort).

pub mod edge;
pub mod motor;
pub mod selector;
pub mod valves;
