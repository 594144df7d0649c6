//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing bench events through the `log`
//! facade. A push adapter towards connected clients would implement the
//! same trait.

use log::{info, warn};

use crate::app::events::BenchEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BenchEvent`] as one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BenchEvent) {
        match event {
            BenchEvent::Started {
                bench,
                pins_written,
            } => {
                info!("START | bench={bench} | init_writes={pins_written}");
            }
            BenchEvent::RegistersRefreshed { pins_written } => {
                info!("REGS  | refreshed | init_writes={pins_written}");
            }
            BenchEvent::RegisterWritten {
                address,
                register,
                value,
            } => {
                info!("WRITE | 0x{address:02x}[0x{register:02x}] = 0b{value:08b}");
            }
            BenchEvent::BusFault(reason) => {
                warn!("FAULT | {reason}");
            }
            BenchEvent::CommandDispatched {
                short_name,
                forced,
                writes,
            } => {
                info!("CMD   | {short_name} | forced={forced} | writes={writes}");
            }
            BenchEvent::ReadingStored { device } => {
                info!("INPUT | {device}");
            }
        }
    }
}
