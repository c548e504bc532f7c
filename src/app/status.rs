//! Measurement and read-only projections handed to the outside world.

use crate::interlock::InterlockState;
use crate::policy::Policy;

/// One sampling cycle's result.  Replaced wholesale every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Forward power (W, `>= 0`).
    pub forward_power: f32,
    /// Reflected power (W, `>= 0`).
    pub reflected_power: f32,
    /// Standing-wave ratio (`>= 1`).
    pub vswr: f32,
}

impl Measurement {
    /// Boot value before the first completed cycle: no power, matched line.
    pub const IDLE: Self = Self {
        forward_power: 0.0,
        reflected_power: 0.0,
        vswr: 1.0,
    };
}

impl Default for Measurement {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Snapshot of the latest measurement together with the interlock state
/// it was evaluated against.  Always taken under the control-state lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub forward_power: f32,
    pub reflected_power: f32,
    pub vswr: f32,
    pub interlock: InterlockState,
    pub auto_unlock: bool,
}

impl StatusView {
    pub fn new(measurement: &Measurement, interlock: InterlockState, auto_unlock: bool) -> Self {
        Self {
            forward_power: measurement.forward_power,
            reflected_power: measurement.reflected_power,
            vswr: measurement.vswr,
            interlock,
            auto_unlock,
        }
    }

    /// `true` while the transmit path is connected.
    pub fn active_key(&self) -> bool {
        !self.interlock.is_locked()
    }

    pub fn is_locked(&self) -> bool {
        self.interlock.is_locked()
    }
}

/// The subset of [`Policy`] exposed by the settings API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsView {
    pub forward_max: f32,
    pub reflected_max: f32,
    pub vswr_max: f32,
    pub reflected_min: f32,
    pub cooldown_ms: u64,
    pub auto_unlock: bool,
}

impl From<&Policy> for SettingsView {
    fn from(p: &Policy) -> Self {
        Self {
            forward_max: p.forward_max,
            reflected_max: p.reflected_max,
            vswr_max: p.vswr_max,
            reflected_min: p.reflected_min,
            cooldown_ms: p.cooldown_ms(),
            auto_unlock: p.auto_unlock,
        }
    }
}
