//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (HTTP API)
//! that the [`Controller`](super::service::Controller) interprets and
//! applies under the control-state lock.

use crate::policy::PartialPolicy;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Release the interlock now, fault or not.  `auto_unlock` is untouched.
    ForceUnlock,

    /// Turn off automatic release and lock.
    Disable,

    /// Turn automatic release back on.  Does not unlock by itself.
    Enable,

    /// Merge a field-by-field validated settings update.
    UpdateSettings(PartialPolicy),
}
