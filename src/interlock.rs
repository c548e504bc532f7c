//! Transmit-path interlock.
//!
//! Two states, evaluated once per sampling cycle:
//!
//! ```text
//!            fault                     fault (re-arm: locked_at = now)
//! Unlocked ─────────▶ Locked{locked_at} ◀──┐
//!    ▲                      │  └───────────┘
//!    └──────────────────────┘
//!      auto_unlock && now − locked_at ≥ cooldown
//! ```
//!
//! Rules run in precedence order: a fault is checked before the cooldown,
//! so a fault that persists (or recurs) while locked keeps restarting the
//! cooldown clock instead of being masked by it.
//!
//! The cooldown is a timestamp comparison, never a wait.  The relay is
//! driven synchronously inside every transition.  A write the relay did
//! not confirm is re-driven at the start of the next evaluation, so the
//! output converges on [`InterlockState`] within one cycle.

use core::fmt;

use log::{debug, info, warn};

use crate::app::ports::RelayPort;
use crate::app::status::Measurement;
use crate::policy::Policy;

// ---------------------------------------------------------------------------
// State and transition vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockState {
    /// Transmit path connected.
    Unlocked,
    /// Transmit path open since `locked_at_ms` (uptime).
    Locked { locked_at_ms: u64 },
}

impl InterlockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// What caused the interlock to (re-)enter `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripReason {
    ForwardOverPower,
    ReflectedOverPower,
    VswrExceeded,
    /// Operator `disable`.
    Manual,
}

impl fmt::Display for TripReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardOverPower => write!(f, "forward power over limit"),
            Self::ReflectedOverPower => write!(f, "reflected power over limit"),
            Self::VswrExceeded => write!(f, "VSWR over limit"),
            Self::Manual => write!(f, "manual disable"),
        }
    }
}

/// What caused the return to `Unlocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCause {
    /// `auto_unlock` with the cooldown elapsed.
    Cooldown,
    /// Operator `force_unlock`.
    Manual,
}

impl fmt::Display for ReleaseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooldown => write!(f, "cooldown elapsed"),
            Self::Manual => write!(f, "manual unlock"),
        }
    }
}

/// Outcome of one evaluation or override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `Unlocked → Locked`.
    Tripped(TripReason),
    /// `Locked → Locked` with the cooldown clock restarted.
    Rearmed(TripReason),
    /// `Locked → Unlocked`.
    Released(ReleaseCause),
}

// ---------------------------------------------------------------------------
// Fault rule
// ---------------------------------------------------------------------------

/// First limit the measurement violates, if any.
///
/// VSWR only counts once reflected power exceeds `reflected_min`; below
/// that the ratio is dominated by detector noise.
pub fn fault_reason(m: &Measurement, p: &Policy) -> Option<TripReason> {
    if m.forward_power > p.forward_max {
        Some(TripReason::ForwardOverPower)
    } else if m.reflected_power > p.reflected_max {
        Some(TripReason::ReflectedOverPower)
    } else if m.vswr > p.vswr_max && m.reflected_power > p.reflected_min {
        Some(TripReason::VswrExceeded)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Interlock
// ---------------------------------------------------------------------------

/// Sole owner of the relay.
pub struct Interlock<R: RelayPort> {
    relay: R,
    state: InterlockState,
}

impl<R: RelayPort> Interlock<R> {
    /// Start `Unlocked` with the relay driven to match.
    pub fn new(mut relay: R) -> Self {
        relay.connect();
        info!("Interlock: armed, transmit path connected");
        Self {
            relay,
            state: InterlockState::Unlocked,
        }
    }

    pub fn state(&self) -> InterlockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Apply the transition rules to one cycle's measurement.
    pub fn evaluate(&mut self, m: &Measurement, p: &Policy, now_ms: u64) -> Option<Transition> {
        self.reconcile();

        // Rule 1: fault trip / re-arm.
        if let Some(reason) = fault_reason(m, p) {
            let transition = self.lock(reason, now_ms);
            if let Transition::Tripped(_) = transition {
                warn!(
                    "Interlock: LOCKED ({}) fwd={:.3}W rev={:.3}W vswr={:.3}",
                    reason, m.forward_power, m.reflected_power, m.vswr
                );
            }
            return Some(transition);
        }

        // Rule 2: cooldown release.
        match self.state {
            InterlockState::Locked { locked_at_ms }
                if p.auto_unlock && now_ms.saturating_sub(locked_at_ms) >= p.cooldown_ms() =>
            {
                Some(self.unlock(ReleaseCause::Cooldown))
            }
            _ => None,
        }
    }

    /// Release unconditionally.  `None` when already unlocked.
    pub fn force_unlock(&mut self) -> Option<Transition> {
        if self.is_locked() {
            Some(self.unlock(ReleaseCause::Manual))
        } else {
            None
        }
    }

    /// Lock now, restarting the cooldown clock if already locked.
    pub fn force_lock(&mut self, now_ms: u64) -> Transition {
        let transition = self.lock(TripReason::Manual, now_ms);
        if let Transition::Tripped(_) = transition {
            warn!("Interlock: LOCKED ({})", TripReason::Manual);
        }
        transition
    }

    // ── Transitions ───────────────────────────────────────────────

    fn lock(&mut self, reason: TripReason, now_ms: u64) -> Transition {
        let was_locked = self.is_locked();
        self.enter(InterlockState::Locked { locked_at_ms: now_ms });
        if was_locked {
            debug!("Interlock: re-armed ({}) at {} ms", reason, now_ms);
            Transition::Rearmed(reason)
        } else {
            Transition::Tripped(reason)
        }
    }

    fn unlock(&mut self, cause: ReleaseCause) -> Transition {
        self.enter(InterlockState::Unlocked);
        info!("Interlock: UNLOCKED ({})", cause);
        Transition::Released(cause)
    }

    fn enter(&mut self, next: InterlockState) {
        self.state = next;
        self.drive();
    }

    /// Whether the relay has confirmed the output the state calls for.
    pub fn output_matches(&self) -> bool {
        self.relay.is_energized() == self.state.is_locked()
    }

    fn reconcile(&mut self) {
        if !self.output_matches() {
            warn!(
                "Interlock: relay disagrees with {:?}, re-driving",
                self.state
            );
            self.drive();
        }
    }

    /// The only place the relay is driven after construction.
    fn drive(&mut self) {
        match self.state {
            InterlockState::Locked { .. } => self.relay.disconnect(),
            InterlockState::Unlocked => self.relay.connect(),
        }
    }
}
