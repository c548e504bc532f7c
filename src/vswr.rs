//! VSWR derivation from forward/reflected power.
//!
//! The reflection magnitude is taken in the voltage domain as
//! `q = sqrt(P_ref / P_fwd)`, and `VSWR = (1 + q) / (1 - q)`.
//! The result is always finite and `>= 1.0`: below the measurable
//! forward-power floor it is exactly `1.0`, and a diverging ratio
//! (`q >= 1`, non-finite input) is pinned to [`MAX_VSWR`] so it can never
//! slip under a `> threshold` check.

/// Ceiling reported when the ratio diverges.
pub const MAX_VSWR: f32 = 999.0;

/// Stateless VSWR calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VswrEngine;

impl VswrEngine {
    pub const fn new() -> Self {
        Self
    }

    /// VSWR for one power pair.  `forward_min` is the measurable floor.
    pub fn compute(&self, forward_power: f32, reflected_power: f32, forward_min: f32) -> f32 {
        if forward_power <= forward_min {
            return 1.0;
        }
        match reflection_coefficient(forward_power, reflected_power) {
            Some(q) if q < 1.0 => ((1.0 + q) / (1.0 - q)).clamp(1.0, MAX_VSWR),
            _ => MAX_VSWR,
        }
    }
}

/// `|Γ| = sqrt(P_ref / P_fwd)`, or `None` when it cannot be formed.
pub fn reflection_coefficient(forward_power: f32, reflected_power: f32) -> Option<f32> {
    if !forward_power.is_finite() || !reflected_power.is_finite() || forward_power <= 0.0 {
        return None;
    }
    Some((reflected_power.max(0.0) / forward_power).sqrt())
}
