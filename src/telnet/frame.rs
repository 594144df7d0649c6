//! Line framing for input-state listings.
//!
//! The device answers `lsen` with a block like:
//!
//! ```text
//! Etat des entrees:          <- marker
//! <header>
//! <header>
//! 0 1 0 0 1 1 0 0            <- frame line 1
//! 1 0 0 0 0 0 0 1            <- frame line 2
//! ```
//!
//! Chunks arrive at arbitrary boundaries, so bytes accumulate in a
//! per-device buffer until the marker and both frame lines are present.
//! Only newline-terminated lines count; a line still being received is
//! never taken as complete. On a complete frame the buffer is cleared.

use serde::Serialize;

/// Line announcing an input-state listing.
pub const MARKER: &str = "Etat des entrees:";

/// Frame lines start this many lines after the marker line.
pub const HEADER_OFFSET: usize = 3;

/// Number of lines in one frame.
pub const FRAME_LINES: usize = 2;

/// Upper bound on buffered text while waiting for a frame. Past it, only
/// the text from the latest marker on is kept, or nothing if that is still
/// too long.
pub const MAX_BUFFER: usize = 16 * 1024;

/// One parsed input-state listing from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputStateReading {
    pub device: String,
    pub lines: [String; FRAME_LINES],
}

/// Streaming parser for one device's telnet output.
#[derive(Debug, Clone)]
pub struct InputFrameParser {
    device: String,
    buffer: String,
}

impl InputFrameParser {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            buffer: String::new(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Bytes received but not yet consumed by a complete frame.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append a chunk and try to complete a frame.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn feed(&mut self, data: &[u8]) -> Option<InputStateReading> {
        self.buffer.push_str(&String::from_utf8_lossy(data));
        let Some(lines) = self.try_frame() else {
            self.trim_overflow();
            return None;
        };
        self.buffer.clear();
        Some(InputStateReading {
            device: self.device.clone(),
            lines,
        })
    }

    fn try_frame(&self) -> Option<[String; FRAME_LINES]> {
        // Everything after the last '\n' is a partial line.
        let complete = &self.buffer[..self.buffer.rfind('\n')? + 1];
        let lines: Vec<&str> = complete
            .split_terminator('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();

        let start = lines.iter().position(|l| l.contains(MARKER))?;
        let frame = lines.get(start + HEADER_OFFSET..start + HEADER_OFFSET + FRAME_LINES)?;
        if frame.iter().any(|l| l.is_empty()) {
            return None;
        }
        Some([frame[0].to_owned(), frame[1].to_owned()])
    }

    fn trim_overflow(&mut self) {
        if self.buffer.len() <= MAX_BUFFER {
            return;
        }
        match self.buffer.rfind(MARKER) {
            Some(at) if at > 0 && self.buffer.len() - at <= MAX_BUFFER => {
                self.buffer.drain(..at);
            }
            _ => self.buffer.clear(),
        }
    }
}
