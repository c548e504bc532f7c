//! SWR guard firmware library.
//!
//! Exposes the pure-logic modules for integration testing.  Everything
//! ESP-IDF-specific is behind the `espidf` feature inside each module.

#![deny(unused_must_use)]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod interlock;
pub mod pins;
pub mod policy;
pub mod vswr;

pub mod adapters;
pub mod drivers;
pub mod sensors;
