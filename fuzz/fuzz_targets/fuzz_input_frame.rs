//! Fuzz target: `InputFrameParser::feed`
//!
//! Splits arbitrary bytes into chunks at data-derived boundaries and feeds
//! them to the telnet frame parser. It must never panic, never yield an
//! empty frame line, and never buffer more than `MAX_BUFFER` bytes.
//!
//! cargo fuzz run fuzz_input_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use testbench::telnet::InputFrameParser;
use testbench::telnet::frame::MAX_BUFFER;

fuzz_target!(|data: &[u8]| {
    let Some((&step, rest)) = data.split_first() else {
        return;
    };
    let step = usize::from(step).max(1);

    let mut parser = InputFrameParser::new("fuzz");
    for chunk in rest.chunks(step) {
        if let Some(reading) = parser.feed(chunk) {
            assert!(reading.lines.iter().all(|l| !l.is_empty()));
            assert!(parser.buffer().is_empty());
        }
        assert!(parser.buffer().len() <= MAX_BUFFER);
    }
});
