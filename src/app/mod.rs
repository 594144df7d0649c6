//! Application core: bench domain logic behind port traits.
//!
//! This module holds the request/response surface of the bench: the
//! tagged request type, the response envelope, outbound events and the
//! [`service::BenchService`] that owns the topology and rule graph. All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod envelope;
pub mod events;
pub mod ports;
pub mod requests;
pub mod service;
