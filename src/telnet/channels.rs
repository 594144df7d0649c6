//! Telnet → control loop channel.
//!
//! Uses an `embassy-sync` bounded channel to hand completed readings from
//! the async telnet I/O thread to the synchronous request loop.
//!
//! ```text
//! ┌──────────────┐  InputStateReading  ┌──────────────┐
//! │  Telnet I/O  │────────────────────▶│ Control Loop │
//! │  (async)     │                     │ (sync)       │
//! └──────────────┘                     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::frame::InputStateReading;

/// Channel depth for readings.
const READING_DEPTH: usize = 8;

/// Completed readings: I/O thread → control loop.
pub static READING_CHANNEL: Channel<CriticalSectionRawMutex, InputStateReading, READING_DEPTH> =
    Channel::new();

/// Publish a reading. Dropped with a warning if the consumer lags.
pub fn publish(reading: InputStateReading) {
    let device = reading.device.clone();
    if READING_CHANNEL.try_send(reading).is_err() {
        warn!("telnet[{device}]: reading channel full, dropping reading");
    }
}

/// Try to receive a reading published by the I/O thread.
pub fn try_recv_reading() -> Option<InputStateReading> {
    READING_CHANNEL.try_receive().ok()
}
