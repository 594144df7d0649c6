//! Telnet framing fed in arbitrary chunks, and the reading channel.

use testbench::telnet::channels::{publish, try_recv_reading};
use testbench::telnet::InputFrameParser;

const LISTING: &[u8] =
    b"*BRIO ok\r\nlsen\r\nEtat des entrees:\r\n E1 E2 E3 E4\r\n -----------\r\n  0  1  0  0\r\n  1  0  0  1\r\n> ";

#[test]
fn byte_by_byte_feed_yields_exactly_one_reading() {
    let mut parser = InputFrameParser::new("mesd-1");
    let readings: Vec<_> = LISTING
        .iter()
        .filter_map(|b| parser.feed(core::slice::from_ref(b)))
        .collect();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].lines[0], "  0  1  0  0");
    assert_eq!(readings[0].lines[1], "  1  0  0  1");
    // The reading completes on the second frame line's newline; the prompt
    // arrives afterwards into a fresh buffer.
    assert_eq!(parser.buffer(), "> ");
}

#[test]
fn consecutive_listings_produce_consecutive_readings() {
    let mut parser = InputFrameParser::new("mesd-1");
    let first = parser.feed(LISTING).unwrap();
    parser.reset();
    let second = parser
        .feed(&LISTING.iter().map(|&b| if b == b'1' { b'0' } else { b }).collect::<Vec<_>>())
        .unwrap();
    assert_ne!(first.lines, second.lines);
    assert_eq!(second.lines[1], "  0  0  0  0");
}

#[test]
fn published_readings_reach_the_control_loop() {
    let mut parser = InputFrameParser::new("mesd-2");
    let reading = parser.feed(LISTING).unwrap();
    publish(reading.clone());
    let received = std::iter::from_fn(try_recv_reading).find(|r| r.device == "mesd-2");
    assert_eq!(received, Some(reading));
}
