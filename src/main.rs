//! Test bench console driver.
//!
//! Reads one JSON request per line on stdin and writes one JSON response
//! envelope per line on stdout. Logs go to stderr.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                    │
//! │  SimBus / I2cBus   LogEventSink   JsonConfigAdapter   Clock   │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │            BenchService (single owner)                  │  │
//! │  │  Topology · Register engine · Etats · Commands          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │  telnet-io thread ──(READING_CHANNEL)──▶ request loop         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use testbench::adapters::json_config::JsonConfigAdapter;
use testbench::adapters::log_sink::LogEventSink;
use testbench::adapters::sim_bus::SimBus;
use testbench::adapters::time::MonotonicClock;
use testbench::app::envelope::Envelope;
use testbench::app::ports::{ClockPort, ConfigPort};
use testbench::app::requests::BenchRequest;
use testbench::app::service::BenchService;
use testbench::telnet::{channels, io_task};

/// How often the request loop drains telnet readings while idle.
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "testbench", version, about = "I2C GPIO-expander test bench")]
struct Args {
    /// Bench configuration file.
    #[arg(long, default_value = "config/bench.example.json")]
    config: PathBuf,

    /// Bench to activate instead of the file's default.
    #[arg(long)]
    bench: Option<String>,

    /// Do not connect to the bench's telnet devices.
    #[arg(long, default_value_t = false)]
    no_telnet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("testbench v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = JsonConfigAdapter::new(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;

    // ── 2. Service + hardware bring-up ────────────────────────
    let clock = MonotonicClock::new();
    let mut service = BenchService::new(config, args.bench.as_deref(), clock)?;
    // Simulated expanders. On hardware, wrap the board's
    // `embedded_hal::i2c::I2c` master in `I2cBus::new` instead.
    let mut bus = SimBus::new();
    let mut sink = LogEventSink::new();
    service
        .start(&mut bus, &mut sink)
        .context("bench bring-up failed")?;

    // ── 3. Telnet sessions ────────────────────────────────────
    // TODO: restart the telnet sessions when changeConfiguration selects a
    // bench with a different device list.
    let _telnet = if args.no_telnet {
        None
    } else {
        io_task::spawn(service.telnet_devices().to_vec()).context("spawning telnet I/O thread")?
    };

    // ── 4. Request loop ───────────────────────────────────────
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("stdin: {e}");
                        break;
                    }
                }
            }
        })
        .context("spawning stdin reader")?;

    info!("bench `{}` ready, reading requests on stdin", service.bench_name());
    let clock = MonotonicClock::new();
    let stdout = std::io::stdout();
    loop {
        while let Some(reading) = channels::try_recv_reading() {
            service.store_reading(reading, &mut sink);
        }

        let line = match rx.recv_timeout(IDLE_POLL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let envelope = match serde_json::from_str::<BenchRequest>(&line) {
            Ok(request) => service.handle(request, &mut bus, &mut sink),
            Err(e) => {
                warn!("rejected request: {e}");
                Envelope::failure(clock.epoch_ms(), "unknown", 400, "INVALID_REQUEST", e.to_string())
            }
        };

        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &envelope)?;
        writeln!(out)?;
        out.flush()?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
