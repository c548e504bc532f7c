//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   AdcPort ──▶ Sampler ──▶ Controller ──▶ RelayPort
//!                               │
//!                               └──▶ EventSink / StatusPublisher
//! ```
//!
//! Driven adapters (ADC, relay, event sinks, publishers) implement these
//! traits.  The [`Controller`](super::service::Controller) and
//! [`ControlLoop`](super::service::ControlLoop) consume them via generics,
//! so the domain core never touches hardware directly.

use crate::error::SampleError;

use super::events::AppEvent;
use super::status::StatusView;

// ───────────────────────────────────────────────────────────────
// ADC port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The two differential inputs of the directional coupler detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Forward-power detector (AIN0 − AIN1).
    Forward,
    /// Reflected-power detector (AIN2 − AIN3).
    Reflected,
}

/// Read-side port: one signed 16-bit conversion per call.
///
/// Implementations may block for the conversion time; they must not
/// be called while the control-state lock is held.
pub trait AdcPort {
    /// Convert one differential channel and return the raw code.
    fn read_differential(&mut self, channel: Channel) -> Result<i16, SampleError>;

    /// Volts per code at the configured gain.
    fn lsb_volts(&self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the transmit-path relay.
///
/// Only [`Interlock`](crate::interlock::Interlock) holds one.  Energised
/// means the transmit path is open (locked out).
pub trait RelayPort {
    /// De-energise: transmit path closed.
    fn connect(&mut self);

    /// Energise: transmit path open.
    fn disconnect(&mut self);

    /// Whether the last write that took effect energised the coil.  A
    /// write the output refused leaves this unchanged.
    fn is_energized(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Status publisher port (driven adapter: domain → pub/sub)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget broadcast of the status snapshot after each completed
/// cycle.  Implementations swallow their own failures.
pub trait StatusPublisher {
    fn publish(&mut self, status: &StatusView);
}

/// Publisher for deployments without a side channel.
impl StatusPublisher for () {
    fn publish(&mut self, _status: &StatusView) {}
}

/// A side channel that may have failed to come up at boot.
impl<P: StatusPublisher> StatusPublisher for Option<P> {
    fn publish(&mut self, status: &StatusView) {
        if let Some(p) = self {
            p.publish(status);
        }
    }
}
