//! GPIO / peripheral pin assignments for the SWR guard board (ESP32-WROOM).
//!
//! Single source of truth: `main` takes pins by these numbers and nothing
//! else hard-codes them.

// ---------------------------------------------------------------------------
// Transmit-path relay
// ---------------------------------------------------------------------------

/// Digital output: HIGH = coil energised = transmit path open.
pub const RELAY_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// ADS1115 detector ADC (I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// 400 kHz fast mode.
pub const I2C_BAUD_HZ: u32 = 400_000;
/// ADDR strapped to GND.
pub const ADS1115_ADDRESS: u8 = crate::drivers::ads1115::DEFAULT_ADDRESS;
