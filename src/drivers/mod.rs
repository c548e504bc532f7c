//! Peripheral drivers: detector ADC, relay output, task watchdog.

pub mod ads1115;
pub mod relay;
pub mod watchdog;
