//! Async telnet I/O task: one session per configured input device.
//!
//! Runs in a dedicated thread using `edge-executor` for cooperative
//! scheduling and `async-io-mini` for reactor-driven timers. Each session
//! is its own future:
//!
//! 1. **Connect**: TCP connect, send the password line and `lsen`
//! 2. **Read**: polls the nonblocking socket every 10ms, feeding the
//!    device's [`InputFrameParser`]
//! 3. **Reconnect**: on close or error, waits and starts over
//!
//! Completed readings go to [`READING_CHANNEL`](super::channels::READING_CHANNEL).
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │  telnet-io thread                                    │
//!  │  ┌────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                  │  │
//!  │  │  ┌───────────┐ ┌───────────┐     ┌───────────┐ │  │
//!  │  │  │ session 0 │ │ session 1 │ ... │ session N │ │  │
//!  │  │  │ 10ms ⏱    │ │ 10ms ⏱    │     │ 10ms ⏱    │ │  │
//!  │  │  └───────────┘ └───────────┘     └───────────┘ │  │
//!  │  └────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────┘
//! ```

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use core::time::Duration;
use log::{info, warn};

use super::channels::publish;
use super::frame::InputFrameParser;
use crate::config::TelnetDevice;

/// Executor task slots; one per session.
pub const MAX_SESSIONS: usize = 8;

const READ_BUF_SIZE: usize = 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Command asking the device for its input-state listing.
const LIST_INPUTS: &[u8] = b"lsen\r\n";

// ── Session ──────────────────────────────────────────────────

/// Open the TCP connection and log in.
///
/// The connect itself is blocking (bounded by [`CONNECT_TIMEOUT`]); the
/// socket is switched to nonblocking before reading starts.
fn connect(device: &TelnetDevice) -> io::Result<TcpStream> {
    let addr = (device.host.as_str(), device.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host did not resolve"))?;
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.write_all(format!("{}\r\n", device.password).as_bytes())?;
    stream.write_all(LIST_INPUTS)?;
    stream.flush()?;
    stream.set_nonblocking(true)?;
    Ok(stream)
}

/// Read until the connection closes or fails.
async fn pump(stream: &mut TcpStream, parser: &mut InputFrameParser) {
    let mut read_buf = [0u8; READ_BUF_SIZE];
    loop {
        match stream.read(&mut read_buf) {
            Ok(0) => {
                info!("telnet[{}]: connection closed by peer", parser.device());
                return;
            }
            Ok(n) => {
                if let Some(reading) = parser.feed(&read_buf[..n]) {
                    info!("telnet[{}]: input states received", reading.device);
                    publish(reading);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("telnet[{}]: read error: {e}", parser.device());
                return;
            }
        }
        async_io_mini::Timer::after(POLL_INTERVAL).await;
    }
}

async fn session_loop(device: TelnetDevice) {
    let mut parser = InputFrameParser::new(device.name.clone());
    loop {
        info!(
            "telnet[{}]: connecting to {}:{}",
            device.name, device.host, device.port
        );
        match connect(&device) {
            Ok(mut stream) => {
                info!("telnet[{}]: connected", device.name);
                parser.reset();
                pump(&mut stream, &mut parser).await;
            }
            Err(e) => warn!("telnet[{}]: connect failed: {e}", device.name),
        }
        async_io_mini::Timer::after(RECONNECT_DELAY).await;
    }
}

// ── Executor ─────────────────────────────────────────────────

fn run_io_loop(devices: Vec<TelnetDevice>) {
    let executor: edge_executor::LocalExecutor<'_, MAX_SESSIONS> =
        edge_executor::LocalExecutor::new();

    let count = devices.len();
    for device in devices {
        executor.spawn(session_loop(device)).detach();
    }
    info!("telnet I/O task started ({count} sessions)");

    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

// ── Thread spawn ─────────────────────────────────────────────

/// Spawn the telnet I/O thread.
///
/// Returns `Ok(None)` when there is nothing to connect to. Devices beyond
/// [`MAX_SESSIONS`] are ignored with a warning.
pub fn spawn(mut devices: Vec<TelnetDevice>) -> io::Result<Option<std::thread::JoinHandle<()>>> {
    if devices.is_empty() {
        return Ok(None);
    }
    if devices.len() > MAX_SESSIONS {
        warn!(
            "telnet: {} devices configured, only the first {MAX_SESSIONS} are polled",
            devices.len()
        );
        devices.truncate(MAX_SESSIONS);
    }
    std::thread::Builder::new()
        .name("telnet-io".into())
        .spawn(move || run_io_loop(devices))
        .map(Some)
}
