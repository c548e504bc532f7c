//! Forward/reflected power sampler.
//!
//! Reads both detector channels through an [`AdcPort`] and converts the
//! raw codes to power:
//!
//! ```text
//! v_sensor = code · lsb
//! v_line   = max(v_sensor · coupler_ratio, 0)
//! P        = k · v_line²
//! ```
//!
//! A cycle is all-or-nothing: if either channel fails or returns the
//! invalid sentinel, no reading is produced.

use log::{debug, warn};

use crate::app::ports::{AdcPort, Channel};
use crate::error::SampleError;

/// Raw code the ADC path uses to flag a conversion as not-a-number
/// (negative full-scale saturation, `0x8000`).
pub const INVALID_CODE: i16 = i16::MIN;

/// Powers below this are treated as detector noise (W).
const NOISE_FLOOR_W: f32 = 1e-6;

/// Deployment-specific conversion constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Detector volts → line volts.
    pub coupler_ratio: f32,
    /// `P = power_k · v²` (1/Ω; 50 for a 50 Ω-referenced detector).
    pub power_k: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            coupler_ratio: 2.7 / 6.9,
            power_k: 50.0,
        }
    }
}

/// One raw code per channel, as read in a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPair {
    pub forward: i16,
    pub reflected: i16,
}

/// Converted powers for one cycle (both `>= 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    pub forward_power: f32,
    pub reflected_power: f32,
}

/// Exclusive owner of the ADC.
pub struct Sampler<A: AdcPort> {
    adc: A,
    calibration: Calibration,
}

impl<A: AdcPort> Sampler<A> {
    pub fn new(adc: A, calibration: Calibration) -> Self {
        Self { adc, calibration }
    }

    /// Read both channels.  Either one failing discards the pair.
    pub fn acquire(&mut self) -> Result<RawPair, SampleError> {
        let forward = self.read_channel(Channel::Forward)?;
        let reflected = self.read_channel(Channel::Reflected)?;
        Ok(RawPair { forward, reflected })
    }

    /// Convert a raw pair to clamped power values.
    pub fn convert(&self, raw: RawPair) -> PowerReading {
        let lsb = self.adc.lsb_volts();
        PowerReading {
            forward_power: self.code_to_power(raw.forward, lsb),
            reflected_power: self.code_to_power(raw.reflected, lsb),
        }
    }

    /// `acquire` followed by `convert`.
    pub fn sample(&mut self) -> Result<PowerReading, SampleError> {
        self.acquire().map(|raw| self.convert(raw))
    }

    fn read_channel(&mut self, channel: Channel) -> Result<i16, SampleError> {
        match self.adc.read_differential(channel) {
            Ok(INVALID_CODE) => {
                debug!("Sampler: {:?} returned invalid sentinel", channel);
                Err(SampleError::Invalid)
            }
            Ok(code) => Ok(code),
            Err(e) => {
                if e == SampleError::Bus {
                    warn!("Sampler: {:?} read failed: {}", channel, e);
                }
                Err(e)
            }
        }
    }

    fn code_to_power(&self, code: i16, lsb: f32) -> f32 {
        let line_volts = (f32::from(code) * lsb * self.calibration.coupler_ratio).max(0.0);
        let power = self.calibration.power_k * line_volts * line_volts;
        if power.is_finite() && power >= NOISE_FLOOR_W {
            power
        } else {
            0.0
        }
    }
}
