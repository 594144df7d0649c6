//! Telnet input devices: framing, session I/O and the reading channel.

pub mod channels;
pub mod frame;
pub mod io_task;

pub use frame::{InputFrameParser, InputStateReading};
