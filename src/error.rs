//! Unified error types for the SWR guard firmware.
//!
//! One small enum per failure domain, each convertible into the top-level
//! [`Error`].  All variants are `Copy` so they can be passed through the
//! control loop and the HTTP layer without allocation.

use core::fmt;

use crate::policy::PolicyField;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sampling cycle could not produce a measurement.
    Sample(SampleError),
    /// A settings update field was rejected.
    Validation(ValidationError),
    /// A peripheral failed to come up at boot.
    HardwareInit(HardwareInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample(e) => write!(f, "sample: {e}"),
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::HardwareInit(e) => write!(f, "hardware init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sampling errors
// ---------------------------------------------------------------------------

/// Why a sampling cycle was discarded.
///
/// Every variant is recovered locally: the cycle is skipped and the
/// previous measurement and interlock state are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// The ADC returned the designated not-a-number sentinel.
    Invalid,
    /// The I2C transfer to the ADC failed.
    Bus,
    /// The conversion-ready flag never came up.
    Timeout,
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid ADC reading"),
            Self::Bus => write!(f, "ADC bus transfer failed"),
            Self::Timeout => write!(f, "ADC conversion timed out"),
        }
    }
}

impl From<SampleError> for Error {
    fn from(e: SampleError) -> Self {
        Self::Sample(e)
    }
}

// ---------------------------------------------------------------------------
// Settings validation
// ---------------------------------------------------------------------------

/// A settings field that was present in an update but not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The value parsed but violates the field's range (`> 0`, `>= 0`).
    OutOfRange(PolicyField),
    /// The value has the wrong JSON type for the field.
    Malformed(PolicyField),
}

impl ValidationError {
    /// The field that was rejected.
    pub fn field(&self) -> PolicyField {
        match self {
            Self::OutOfRange(field) | Self::Malformed(field) => *field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(field) => write!(f, "{field} out of range"),
            Self::Malformed(field) => write!(f, "{field} malformed"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Boot-time hardware failures
// ---------------------------------------------------------------------------

/// Fatal peripheral initialisation failure.  The only remedy is a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareInitError {
    /// The ADS1115 did not answer on the I2C bus.
    Adc,
    /// The relay GPIO could not be driven to its boot level.
    Relay,
    /// The I2C peripheral itself failed to configure (ESP-IDF error code).
    Bus(i32),
}

impl fmt::Display for HardwareInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adc => write!(f, "ADS1115 not responding"),
            Self::Relay => write!(f, "relay GPIO init failed"),
            Self::Bus(rc) => write!(f, "I2C driver init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HardwareInitError {}

impl From<HardwareInitError> for Error {
    fn from(e: HardwareInitError) -> Self {
        Self::HardwareInit(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
