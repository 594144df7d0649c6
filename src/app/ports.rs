//! Port traits: the hexagonal boundary between the bench core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BenchService (domain)
//! ```
//!
//! Driven adapters (I2C bus, clock, event sinks, configuration source)
//! implement these traits. The [`BenchService`](super::service::BenchService)
//! takes them at call sites, so the core never touches hardware directly.

use crate::config::{ConfigError, ConfigFile};
use crate::error::BusError;

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: domain → expander registers)
// ───────────────────────────────────────────────────────────────

/// Physical register writes on the expander bus.
///
/// Called once per effective pin write. Failures are reported, never
/// retried here; retry policy belongs to the implementation.
pub trait BusPort {
    /// Write `value` to `register` of the expander at I2C `address`.
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError>;
}

impl<T: BusPort + ?Sized> BusPort for &mut T {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        (**self).write_register(address, register, value)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: monotonic time → domain)
// ───────────────────────────────────────────────────────────────

/// Time source for rule debouncing and response timestamps.
pub trait ClockPort {
    /// Monotonic milliseconds. Only differences are meaningful.
    fn now_ms(&self) -> u64;

    /// Wall-clock milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`BenchEvent`](super::events::BenchEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BenchEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: config source → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies the bench configuration file.
///
/// Implementations MUST return a validated [`ConfigFile`]; the service
/// trusts its structural invariants.
pub trait ConfigPort {
    fn load(&self) -> Result<ConfigFile, ConfigError>;
}
