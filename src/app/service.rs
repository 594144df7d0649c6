//! Bench service: the hexagonal core.
//!
//! [`BenchService`] owns the topology, the Etat engine, the command table
//! and the latest telnet readings of the active bench. It is the single
//! owner of that graph: every mutation goes through `&mut self`, and every
//! pin write goes through the register engine in [`crate::gpio`]. All I/O
//! flows through port traits injected at call sites.
//!
//! ```text
//!                  ┌─────────────────────────────┐
//!  BenchRequest ──▶│        BenchService         │──▶ EventSink
//!                  │ Topology · Etats · Commands │
//!      ClockPort ─▶│                             │──▶ BusPort
//!                  └─────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::{BenchConfig, ConfigError, ConfigFile, TelnetDevice};
use crate::error::{BenchError, Result};
use crate::gpio::{self, WriteOutcome};
use crate::rules::{Commande, Etat, StateEngine, commands};
use crate::telnet::InputStateReading;
use crate::topology::{Card, CardPin, GpioModule, PinoutGroup, Topology};

use super::envelope::Envelope;
use super::events::BenchEvent;
use super::ports::{BusPort, ClockPort, EventSink};
use super::requests::BenchRequest;

// ───────────────────────────────────────────────────────────────
// Views
// ───────────────────────────────────────────────────────────────

/// The active bench with live pin states and Etat codes.
#[derive(Debug, Serialize)]
pub struct BenchView<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "Cards")]
    pub cards: &'a [Card],
    #[serde(rename = "Etats")]
    pub etats: &'a [Etat],
    #[serde(rename = "Commandes")]
    pub commandes: &'a [Commande],
    #[serde(rename = "Telnet")]
    pub telnet: &'a [TelnetDevice],
}

/// Why a request could not produce data.
enum Failure {
    Bench(BenchError),
    Encode(serde_json::Error),
}

impl From<BenchError> for Failure {
    fn from(e: BenchError) -> Self {
        Self::Bench(e)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> core::result::Result<Option<Value>, Failure> {
    Ok(Some(serde_json::to_value(value)?))
}

// ───────────────────────────────────────────────────────────────
// BenchService
// ───────────────────────────────────────────────────────────────

pub struct BenchService<C: ClockPort> {
    config: ConfigFile,
    bench: BenchConfig,
    topology: Topology,
    etats: StateEngine,
    commandes: Vec<Commande>,
    /// Latest reading per telnet device of the active bench.
    readings: BTreeMap<String, InputStateReading>,
    clock: C,
}

impl<C: ClockPort> BenchService<C> {
    /// Build the service for bench `name` (the file's default when `None`).
    ///
    /// Does **not** touch the bus; call [`start`](Self::start) next.
    pub fn new(config: ConfigFile, name: Option<&str>, clock: C) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        let bench = config.bench(name)?.clone();
        let topology = config.topology(&bench);
        Ok(Self {
            etats: StateEngine::new(bench.etats.clone()),
            commandes: bench.commandes.clone(),
            topology,
            bench,
            config,
            readings: BTreeMap::new(),
            clock,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure module directions and bring every pin to its initial level.
    pub fn start(&mut self, bus: &mut impl BusPort, sink: &mut impl EventSink) -> Result<()> {
        let pins_written = self.bring_up(bus)?;
        info!(
            "bench `{}` started ({} cards, {} etats, {} commands)",
            self.bench.name,
            self.topology.cards().len(),
            self.etats.etats().len(),
            self.commandes.len()
        );
        sink.emit(&BenchEvent::Started {
            bench: self.bench.name.clone(),
            pins_written,
        });
        Ok(())
    }

    /// Re-run module setup and pin initialisation on the live state.
    pub fn update_registers(&mut self, bus: &mut impl BusPort, sink: &mut impl EventSink) -> Result<()> {
        let pins_written = self.bring_up(bus)?;
        sink.emit(&BenchEvent::RegistersRefreshed { pins_written });
        Ok(())
    }

    /// Switch to another bench of the loaded file and start it.
    ///
    /// Pin states and register bytes start over from the file.
    pub fn change_configuration(
        &mut self,
        name: &str,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let bench = self
            .config
            .bench(Some(name))
            .map_err(|_| BenchError::ConfigurationNotFound(name.into()))?
            .clone();
        info!("switching bench `{}` -> `{}`", self.bench.name, bench.name);
        self.topology = self.config.topology(&bench);
        self.etats = StateEngine::new(bench.etats.clone());
        self.commandes = bench.commandes.clone();
        self.readings.clear();
        self.bench = bench;
        self.start(bus, sink)
    }

    fn bring_up(&mut self, bus: &mut impl BusPort) -> Result<usize> {
        let result = gpio::setup_modules(&self.topology, bus)
            .and_then(|()| gpio::initialise_pins(&mut self.topology, bus));
        self.etats.invalidate();
        result
    }

    // ── Request handling ──────────────────────────────────────

    /// Execute one request and wrap the outcome in a response envelope.
    pub fn handle(
        &mut self,
        request: BenchRequest,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Envelope {
        let name = request.name();
        let result = self.execute(request, bus, sink);
        let date = self.clock.epoch_ms();
        match result {
            Ok(data) => Envelope::ok(date, name, data),
            Err(Failure::Bench(e)) => {
                warn!("{name}: {} ({})", e, e.kind());
                Envelope::error(date, name, &e)
            }
            Err(Failure::Encode(e)) => {
                error!("{name}: response encoding failed: {e}");
                Envelope::failure(date, name, 500, "INTERNAL_ERROR", e.to_string())
            }
        }
    }

    fn execute(
        &mut self,
        request: BenchRequest,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<Option<Value>, Failure> {
        match request {
            BenchRequest::AllCards => encode(self.cards()),
            BenchRequest::Card { card_name } => encode(self.card(&card_name)?),
            BenchRequest::Pin {
                card_name,
                number_on_card,
            } => encode(self.pin(&card_name, &number_on_card)?),
            BenchRequest::AllModules => encode(self.modules()),
            BenchRequest::Module { module } => encode(self.module(module.to_u8("module")?)?),
            BenchRequest::BancPinout => encode(self.pinout()),
            BenchRequest::AllEtats => encode(self.etats()?),
            BenchRequest::Etat { name } => encode(self.etat(&name)?),
            BenchRequest::AllCommands => encode(self.commands()),
            BenchRequest::AvailableCommands => encode(&self.available_commands()?),
            BenchRequest::InputStates => encode(&self.input_states()),
            BenchRequest::AllConfigs => encode(&self.config.configs),
            BenchRequest::CurrentConfig => encode(&self.current_config()?),
            BenchRequest::WriteToCard {
                card_name,
                number_on_card,
                state,
            } => {
                let level = state.to_bool()?;
                self.write_to_card(&card_name, &number_on_card, level, bus, sink)?;
                Ok(None)
            }
            BenchRequest::WriteToModule { module, pin, state } => {
                let (module, pin) = (module.to_u8("module")?, pin.to_u8("pin")?);
                let level = state.to_bool()?;
                self.write_to_module(module, pin, level, bus, sink)?;
                Ok(None)
            }
            BenchRequest::SendCommand {
                command_name,
                force,
            } => {
                self.send_command(&command_name, force, bus, sink)?;
                Ok(None)
            }
            BenchRequest::UpdateRegisters => {
                self.update_registers(bus, sink)?;
                Ok(None)
            }
            BenchRequest::ChangeConfiguration { configuration_name } => {
                self.change_configuration(&configuration_name, bus, sink)?;
                encode(&self.current_config()?)
            }
        }
    }

    // ── Topology reads ────────────────────────────────────────

    pub fn cards(&self) -> &[Card] {
        self.topology.cards()
    }

    pub fn card(&self, name: &str) -> Result<&Card> {
        self.topology.card(name)
    }

    pub fn pin(&self, card: &str, number_on_card: &str) -> Result<&CardPin> {
        self.topology.pin(card, number_on_card)
    }

    pub fn modules(&self) -> &[GpioModule] {
        self.topology.modules()
    }

    pub fn module(&self, api_address: u8) -> Result<&GpioModule> {
        self.topology.module(api_address)
    }

    pub fn pinout(&self) -> &[PinoutGroup] {
        self.topology.pinout()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn bench_name(&self) -> &str {
        &self.bench.name
    }

    // ── Rule reads (refresh first) ────────────────────────────

    fn refresh_etats(&mut self) -> Result<()> {
        self.etats.refresh(&self.topology, self.clock.now_ms())?;
        Ok(())
    }

    pub fn etats(&mut self) -> Result<&[Etat]> {
        self.refresh_etats()?;
        Ok(self.etats.etats())
    }

    pub fn etat(&mut self, name: &str) -> Result<&Etat> {
        self.refresh_etats()?;
        self.etats.etat(name)
    }

    pub fn current_code(&mut self, category: &str) -> Result<i32> {
        self.etats
            .current_code(&self.topology, category, self.clock.now_ms())
    }

    pub fn commands(&self) -> &[Commande] {
        &self.commandes
    }

    pub fn available_commands(&mut self) -> Result<Vec<&Commande>> {
        self.refresh_etats()?;
        commands::list_available(&self.commandes, &self.etats)
    }

    pub fn is_available(&mut self, short_name: &str) -> Result<bool> {
        self.refresh_etats()?;
        let command = self
            .commandes
            .iter()
            .find(|c| c.short_name == short_name)
            .ok_or_else(|| BenchError::CommandNotFound(short_name.into()))?;
        command.is_available(&self.etats)
    }

    pub fn current_config(&mut self) -> Result<BenchView<'_>> {
        self.refresh_etats()?;
        Ok(BenchView {
            name: &self.bench.name,
            cards: self.topology.cards(),
            etats: self.etats.etats(),
            commandes: &self.commandes,
            telnet: &self.bench.telnet,
        })
    }

    // ── Writes ────────────────────────────────────────────────

    pub fn write_to_card(
        &mut self,
        card: &str,
        number_on_card: &str,
        value: bool,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome> {
        let result = gpio::write_card_pin(&mut self.topology, bus, card, number_on_card, value);
        self.track(&result, sink);
        result
    }

    pub fn write_to_module(
        &mut self,
        module: u8,
        pin: u8,
        value: bool,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome> {
        let result = gpio::write_module_pin(&mut self.topology, bus, module, pin, value);
        self.track(&result, sink);
        result
    }

    /// Dispatch a command by short name.
    ///
    /// Outputs are applied in declaration order and dispatch stops at the
    /// first failing write; earlier writes stay applied. Returns the number
    /// of register writes that reached the bus.
    pub fn send_command(
        &mut self,
        short_name: &str,
        force: bool,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        self.refresh_etats()?;
        let command = commands::resolve(&self.commandes, &self.etats, short_name, force)?.clone();

        let mut writes = 0;
        for (card, pin, level) in command.writes() {
            if !self.write_to_card(card, pin, level, bus, sink)?.is_unchanged() {
                writes += 1;
            }
        }
        info!(
            "command `{}` ({}) dispatched{}, {writes} register writes",
            command.short_name,
            command.name,
            if force { " with force" } else { "" }
        );
        sink.emit(&BenchEvent::CommandDispatched {
            short_name: command.short_name,
            forced: force,
            writes,
        });
        Ok(writes)
    }

    /// Invalidate cached Etat codes after any write that may have changed pins.
    fn track(&mut self, result: &Result<WriteOutcome>, sink: &mut impl EventSink) {
        match result {
            Ok(WriteOutcome::Written {
                address,
                register,
                value,
            }) => {
                self.etats.invalidate();
                sink.emit(&BenchEvent::RegisterWritten {
                    address: *address,
                    register: *register,
                    value: *value,
                });
            }
            Err(e @ BenchError::Bus(_)) => {
                self.etats.invalidate();
                sink.emit(&BenchEvent::BusFault(e.to_string()));
            }
            _ => {}
        }
    }

    // ── Telnet readings ───────────────────────────────────────

    /// Keep `reading` as the latest for its device.
    ///
    /// Readings from devices the active bench does not declare are ignored.
    /// Returns whether the reading was stored.
    pub fn store_reading(&mut self, reading: InputStateReading, sink: &mut impl EventSink) -> bool {
        if !self.bench.telnet.iter().any(|d| d.name == reading.device) {
            warn!("telnet reading from unknown device `{}` ignored", reading.device);
            return false;
        }
        sink.emit(&BenchEvent::ReadingStored {
            device: reading.device.clone(),
        });
        self.readings.insert(reading.device.clone(), reading);
        true
    }

    pub fn input_states(&self) -> Vec<&InputStateReading> {
        self.readings.values().collect()
    }

    pub fn telnet_devices(&self) -> &[TelnetDevice] {
        &self.bench.telnet
    }
}
