//! I2C GPIO-expander test bench library.
//!
//! Exposes the bench core (topology, register engine, rules, telnet
//! framing) and its adapters for the console driver and for integration
//! testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod gpio;
pub mod rules;
pub mod telnet;
pub mod topology;

pub use error::{BenchError, BusError};
