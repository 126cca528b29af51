//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (session
//! callbacks, a supervisor, boot-time provisioning) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::ControllerConfig;
use crate::input::SessionHandle;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Bind a newly connected session to a free slot.
    Connect { handle: SessionHandle, is_gamepad: bool },

    /// Free the slot bound to a session.
    Disconnect(SessionHandle),

    /// De-energise every valve and stop the motor.
    ReleaseAll,

    /// Hot-reload configuration (validated before it is applied).
    UpdateConfig(ControllerConfig),
}
