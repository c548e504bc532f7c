//! ADS1115 16-bit delta-sigma ADC driver.
//!
//! Single-shot differential conversions over any `embedded_hal` 1.0 I2C
//! bus.  Each read writes the config register with the OS bit set, polls
//! until the conversion-ready flag comes back, then reads the big-endian
//! conversion register.
//!
//! At 860 SPS a conversion takes ~1.2 ms, so the poll normally succeeds
//! on the second or third check.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::{AdcPort, Channel};
use crate::error::SampleError;

/// Default 7-bit address (ADDR tied to GND).
pub const DEFAULT_ADDRESS: u8 = 0x48;

/// ADS1115 register pointers
mod reg {
    pub const CONVERSION: u8 = 0x00;
    pub const CONFIG: u8 = 0x01;
}

/// Config register fields
mod cfg {
    /// Write: start a conversion.  Read: 1 = idle / result ready.
    pub const OS: u16 = 0x8000;
    pub const MUX_SHIFT: u16 = 12;
    pub const PGA_SHIFT: u16 = 9;
    pub const MODE_SINGLE_SHOT: u16 = 0x0100;
    pub const DR_SHIFT: u16 = 5;
    /// Comparator disabled (COMP_QUE = 11).
    pub const COMP_DISABLE: u16 = 0x0003;
}

/// Full-scale range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gain {
    /// ±6.144 V
    TwoThirds,
    /// ±4.096 V
    One,
    /// ±2.048 V
    #[default]
    Two,
    /// ±1.024 V
    Four,
    /// ±0.512 V
    Eight,
    /// ±0.256 V
    Sixteen,
}

impl Gain {
    const fn as_reg(self) -> u16 {
        match self {
            Self::TwoThirds => 0b000,
            Self::One => 0b001,
            Self::Two => 0b010,
            Self::Four => 0b011,
            Self::Eight => 0b100,
            Self::Sixteen => 0b101,
        }
    }

    /// Full-scale voltage.
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Self::TwoThirds => 6.144,
            Self::One => 4.096,
            Self::Two => 2.048,
            Self::Four => 1.024,
            Self::Eight => 0.512,
            Self::Sixteen => 0.256,
        }
    }

    /// Volts per code.
    pub fn lsb_volts(self) -> f32 {
        self.full_scale_volts() / 32768.0
    }
}

/// Conversion rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    #[default]
    Sps860,
}

impl DataRate {
    const fn as_reg(self) -> u16 {
        match self {
            Self::Sps8 => 0b000,
            Self::Sps16 => 0b001,
            Self::Sps32 => 0b010,
            Self::Sps64 => 0b011,
            Self::Sps128 => 0b100,
            Self::Sps250 => 0b101,
            Self::Sps475 => 0b110,
            Self::Sps860 => 0b111,
        }
    }

    /// Polls before giving up: one conversion period plus margin, at 1 ms each.
    const fn poll_budget_ms(self) -> u32 {
        match self {
            Self::Sps8 => 140,
            Self::Sps16 => 75,
            Self::Sps32 => 40,
            Self::Sps64 => 20,
            Self::Sps128 => 12,
            Self::Sps250 | Self::Sps475 | Self::Sps860 => 8,
        }
    }
}

/// Input multiplexer setting for the two differential pairs.
const fn mux_for(channel: Channel) -> u16 {
    match channel {
        Channel::Forward => 0b000,   // AIN0 − AIN1
        Channel::Reflected => 0b011, // AIN2 − AIN3
    }
}

/// ADS1115 driver.
pub struct Ads1115<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    gain: Gain,
    rate: DataRate,
}

impl<I2C: I2c, D: DelayNs> Ads1115<I2C, D> {
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            gain: Gain::default(),
            rate: DataRate::default(),
        }
    }

    /// Set the full-scale range (applies from the next conversion).
    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    /// Set the data rate (applies from the next conversion).
    pub fn with_rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Check the device answers by reading its config register.
    pub fn probe(&mut self) -> Result<(), SampleError> {
        self.read_register(reg::CONFIG).map(|_| ())
    }

    /// Config word that starts a single-shot conversion on `channel`.
    pub fn config_word(&self, channel: Channel) -> u16 {
        cfg::OS
            | (mux_for(channel) << cfg::MUX_SHIFT)
            | (self.gain.as_reg() << cfg::PGA_SHIFT)
            | cfg::MODE_SINGLE_SHOT
            | (self.rate.as_reg() << cfg::DR_SHIFT)
            | cfg::COMP_DISABLE
    }

    /// Run one conversion and return the raw code.
    pub fn convert(&mut self, channel: Channel) -> Result<i16, SampleError> {
        let word = self.config_word(channel);
        self.write_register(reg::CONFIG, word)?;

        let mut budget = self.rate.poll_budget_ms();
        loop {
            self.delay.delay_ms(1);
            if self.read_register(reg::CONFIG)? & cfg::OS != 0 {
                break;
            }
            budget = budget.saturating_sub(1);
            if budget == 0 {
                return Err(SampleError::Timeout);
            }
        }

        self.read_register(reg::CONVERSION).map(|raw| raw as i16)
    }

    /// Release the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    // ── Bus helpers ──────────────────────────────────────────────

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), SampleError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[register, hi, lo])
            .map_err(|_| SampleError::Bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u16, SampleError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|_| SampleError::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I2C: I2c, D: DelayNs> AdcPort for Ads1115<I2C, D> {
    fn read_differential(&mut self, channel: Channel) -> Result<i16, SampleError> {
        self.convert(channel)
    }

    fn lsb_volts(&self) -> f32 {
        self.gain.lsb_volts()
    }
}
