//! Outbound bench events.
//!
//! The [`BenchService`](super::service::BenchService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (log, push to connected clients).

/// Structured events emitted by the bench core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchEvent {
    /// A bench configuration was brought up (setup and pin initialisation).
    Started { bench: String, pins_written: usize },

    /// `updateRegisters` re-ran setup and initialisation.
    RegistersRefreshed { pins_written: usize },

    /// A register byte changed and went to the bus.
    RegisterWritten { address: u8, register: u8, value: u8 },

    /// A register write failed on the bus; logical state was kept.
    BusFault(String),

    /// A command was dispatched to completion.
    CommandDispatched {
        short_name: String,
        forced: bool,
        writes: usize,
    },

    /// A telnet device delivered a new input-state reading.
    ReadingStored { device: String },
}
