//! Sensor subsystem.
//!
//! The directional coupler's two detector outputs are read through a
//! single [`Sampler`](sampler::Sampler), which owns the ADC exclusively.

pub mod sampler;

pub use sampler::{Calibration, PowerReading, RawPair, Sampler};
