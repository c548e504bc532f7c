//! Hardware bring-up: turns raw buses and pins into port implementations.
//!
//! [`bring_up`] is the only place peripherals are probed.  Any failure
//! here is fatal: the caller logs it and restarts the chip.  Works over
//! the `embedded_hal` traits, so the same path runs against mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::drivers::ads1115::{Ads1115, DataRate, Gain};
use crate::drivers::relay::RelayDriver;
use crate::error::{HardwareInitError, Result};

/// Probe attempts before the ADC is declared missing.
const PROBE_ATTEMPTS: u32 = 3;

/// Ready-to-use ADC and relay.
pub struct Hardware<I2C, D, P> {
    pub adc: Ads1115<I2C, D>,
    pub relay: RelayDriver<P>,
}

/// Release the relay first, then find the ADC.
pub fn bring_up<I2C, D, P>(i2c: I2C, delay: D, address: u8, relay_pin: P) -> Result<Hardware<I2C, D, P>>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
{
    let relay = RelayDriver::new(relay_pin)?;
    info!("HW: relay released (transmit path connected)");

    let mut adc = Ads1115::new(i2c, delay, address)
        .with_gain(Gain::Two)
        .with_rate(DataRate::Sps860);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match adc.probe() {
            Ok(()) => break,
            Err(e) if attempt < PROBE_ATTEMPTS => {
                warn!("HW: ADS1115 probe {} failed ({}), retrying", attempt, e);
            }
            Err(_) => return Err(HardwareInitError::Adc.into()),
        }
    }
    info!(
        "HW: ADS1115 at 0x{:02X} (±{} V, 860 SPS)",
        address,
        adc.gain().full_scale_volts()
    );

    Ok(Hardware { adc, relay })
}
