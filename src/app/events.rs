//! Outbound application events.
//!
//! The control loop and controller emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::error::SampleError;
use crate::interlock::{ReleaseCause, TripReason};

use super::status::Measurement;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The sampling actor is up; carries whether the interlock starts locked.
    Started { locked: bool },

    /// The interlock entered `Locked`.
    Tripped {
        reason: TripReason,
        measurement: Measurement,
    },

    /// A fault held while already locked; the cooldown clock restarted.
    Rearmed { reason: TripReason },

    /// The interlock returned to `Unlocked`.
    Released { cause: ReleaseCause },

    /// A sampling cycle was discarded.
    SampleSkipped(SampleError),

    /// A settings update was processed.  `rejected` is set when at least
    /// one field was refused.
    SettingsChanged { rejected: bool },
}
