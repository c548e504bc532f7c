//! Runtime-mutable safety-limit policy.
//!
//! The [`Policy`] is initialised from compiled defaults at boot and then
//! mutated in place by the configuration interface through
//! [`Policy::apply_update`].  Each field of a [`PartialPolicy`] is
//! validated and applied on its own: a bad field is rejected without
//! rolling back the good ones sent alongside it.

use core::fmt;
use core::time::Duration;

use log::{info, warn};

use crate::error::ValidationError;
use crate::vswr::MAX_VSWR;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Safety thresholds and release behaviour consulted by the interlock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Policy {
    /// Forward power above which the interlock trips (W).
    pub forward_max: f32,
    /// Reflected power above which the interlock trips (W).
    pub reflected_max: f32,
    /// VSWR above which the interlock trips, once `reflected_min` is exceeded.
    pub vswr_max: f32,
    /// Reflected power below which a VSWR reading is not trusted (W).
    pub reflected_min: f32,
    /// Forward power at or below which VSWR is reported as 1.0 (W).
    pub forward_min: f32,
    /// Minimum dwell in `Locked` before automatic release.
    pub cooldown: Duration,
    /// Release automatically once the cooldown has elapsed.
    pub auto_unlock: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            forward_max: 50.0,
            reflected_max: 1.0,
            vswr_max: 1.5,
            reflected_min: 0.1,
            forward_min: 0.001, // roughly 1 mW
            cooldown: Duration::from_millis(2000),
            auto_unlock: true,
        }
    }
}

impl Policy {
    /// Apply a validated partial update, field by field.
    ///
    /// Absent fields are left unchanged.  Every present field is checked
    /// independently; valid ones are applied even when a sibling fails.
    /// Returns the first rejection, if any.
    pub fn apply_update(&mut self, partial: &PartialPolicy) -> Result<(), ValidationError> {
        let mut first_err = None;
        let mut reject = |e: ValidationError| {
            warn!("Policy: rejected {}", e);
            if first_err.is_none() {
                first_err = Some(e);
            }
        };

        for (field, value) in partial.thresholds() {
            let Some(value) = value else { continue };
            match value.and_then(|v| validate_threshold(field, v)) {
                Ok(v) => {
                    if let Some(slot) = self.threshold_mut(field) {
                        *slot = v;
                        info!("Policy: {} = {:.3}", field, v);
                    }
                }
                Err(e) => reject(e),
            }
        }

        if let Some(cooldown) = partial.cooldown_ms {
            match cooldown.and_then(validate_cooldown) {
                Ok(d) => {
                    self.cooldown = d;
                    info!("Policy: cooldown = {} ms", d.as_millis());
                }
                Err(e) => reject(e),
            }
        }

        if let Some(auto_unlock) = partial.auto_unlock {
            match auto_unlock {
                Ok(on) => {
                    self.auto_unlock = on;
                    info!("Policy: auto_unlock = {}", on);
                }
                Err(e) => reject(e),
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    /// True when every field satisfies its invariant.
    pub fn is_valid(&self) -> bool {
        PolicyField::THRESHOLDS
            .iter()
            .filter_map(|&f| self.threshold(f).map(|v| (f, v)))
            .all(|(f, v)| validate_threshold(f, v).is_ok())
    }

    /// Cooldown in whole milliseconds, as exposed over the API.
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown.as_millis() as u64
    }

    fn threshold(&self, field: PolicyField) -> Option<f32> {
        match field {
            PolicyField::ForwardMax => Some(self.forward_max),
            PolicyField::ReflectedMax => Some(self.reflected_max),
            PolicyField::VswrMax => Some(self.vswr_max),
            PolicyField::ReflectedMin => Some(self.reflected_min),
            PolicyField::ForwardMin => Some(self.forward_min),
            PolicyField::Cooldown | PolicyField::AutoUnlock => None,
        }
    }

    fn threshold_mut(&mut self, field: PolicyField) -> Option<&mut f32> {
        match field {
            PolicyField::ForwardMax => Some(&mut self.forward_max),
            PolicyField::ReflectedMax => Some(&mut self.reflected_max),
            PolicyField::VswrMax => Some(&mut self.vswr_max),
            PolicyField::ReflectedMin => Some(&mut self.reflected_min),
            PolicyField::ForwardMin => Some(&mut self.forward_min),
            PolicyField::Cooldown | PolicyField::AutoUnlock => None,
        }
    }
}

fn validate_threshold(field: PolicyField, value: f32) -> Result<f32, ValidationError> {
    // A limit at or above the divergence ceiling would let total
    // reflection read as in-range.
    let below_ceiling = field != PolicyField::VswrMax || value < MAX_VSWR;
    if value.is_finite() && value > 0.0 && below_ceiling {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange(field))
    }
}

fn validate_cooldown(ms: f64) -> Result<Duration, ValidationError> {
    // Upper bound keeps the conversion to `u64` lossless.
    if ms.is_finite() && (0.0..=u32::MAX as f64).contains(&ms) {
        Ok(Duration::from_millis(ms.round() as u64))
    } else {
        Err(ValidationError::OutOfRange(PolicyField::Cooldown))
    }
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Value slot of a partial update: `None` = field absent, `Some(Err)` =
/// field present but its value could not be decoded.
pub type FieldValue<T> = Option<Result<T, ValidationError>>;

/// An update request where every field is optional.
///
/// Built by the API layer from a settings body; unrecognised body fields
/// never make it into this structure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialPolicy {
    pub forward_max: FieldValue<f32>,
    pub reflected_max: FieldValue<f32>,
    pub vswr_max: FieldValue<f32>,
    pub reflected_min: FieldValue<f32>,
    pub forward_min: FieldValue<f32>,
    /// Cooldown in milliseconds (validated `>= 0`).
    pub cooldown_ms: FieldValue<f64>,
    pub auto_unlock: FieldValue<bool>,
}

impl PartialPolicy {
    /// True when the update carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.thresholds().iter().all(|(_, v)| v.is_none())
            && self.cooldown_ms.is_none()
            && self.auto_unlock.is_none()
    }

    fn thresholds(&self) -> [(PolicyField, FieldValue<f32>); 5] {
        [
            (PolicyField::ForwardMax, self.forward_max),
            (PolicyField::ReflectedMax, self.reflected_max),
            (PolicyField::VswrMax, self.vswr_max),
            (PolicyField::ReflectedMin, self.reflected_min),
            (PolicyField::ForwardMin, self.forward_min),
        ]
    }
}

// ---------------------------------------------------------------------------
// Field identity
// ---------------------------------------------------------------------------

/// Names every policy field, using the wire names of the settings API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    ForwardMax,
    ReflectedMax,
    VswrMax,
    ReflectedMin,
    ForwardMin,
    Cooldown,
    AutoUnlock,
}

impl PolicyField {
    /// Fields validated with the `> 0` rule.
    pub const THRESHOLDS: [Self; 5] = [
        Self::ForwardMax,
        Self::ReflectedMax,
        Self::VswrMax,
        Self::ReflectedMin,
        Self::ForwardMin,
    ];

    /// JSON key used by the settings API.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::ForwardMax => "fwd_max",
            Self::ReflectedMax => "rev_max",
            Self::VswrMax => "vswr_max",
            Self::ReflectedMin => "rev_min",
            Self::ForwardMin => "fwd_min",
            Self::Cooldown => "cooldown",
            Self::AutoUnlock => "auto_unlock",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
