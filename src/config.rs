//! Bench configuration file.
//!
//! One JSON file describes the shared GPIO hardware (modules and pinout)
//! and any number of named bench configurations (cards, Etats, commands,
//! telnet devices). One bench is active at a time, selected by name.
//!
//! ```json
//! {
//!   "app":  { "defaultConfig": "bench-a" },
//!   "gpio": { "defaultState": false, "modules": [..], "pinout": [..] },
//!   "configs": [ { "Name": "bench-a", "Cards": [..], "Etats": [..],
//!                  "Commandes": [..], "Telnet": [..] } ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{Commande, Etat};
use crate::topology::model::MAX_GROUP_PINS;
use crate::topology::{Card, GpioModule, GpioRef, PinoutGroup, Topology};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no bench configuration named `{0}`")]
    UnknownBench(String),
    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    #[serde(rename = "defaultConfig")]
    pub default_config: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioSection {
    /// Level given at startup to card pins without an explicit state.
    #[serde(rename = "defaultState", default)]
    pub default_state: bool,
    pub modules: Vec<GpioModule>,
    pub pinout: Vec<PinoutGroup>,
}

/// A remote input device read over telnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelnetDevice {
    pub name: String,
    pub host: String,
    #[serde(default = "default_telnet_port")]
    pub port: u16,
    #[serde(default)]
    pub password: String,
}

const fn default_telnet_port() -> u16 {
    23
}

/// One named bench: which cards exist and the rules over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Cards", default)]
    pub cards: Vec<Card>,
    #[serde(rename = "Etats", default)]
    pub etats: Vec<Etat>,
    #[serde(rename = "Commandes", default)]
    pub commandes: Vec<Commande>,
    #[serde(rename = "Telnet", default)]
    pub telnet: Vec<TelnetDevice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub app: AppSection,
    pub gpio: GpioSection,
    pub configs: Vec<BenchConfig>,
}

impl ConfigFile {
    /// Parse and validate.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_json::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    /// Bench named `name`, or the default bench when `None`.
    pub fn bench(&self, name: Option<&str>) -> Result<&BenchConfig, ConfigError> {
        let name = name.unwrap_or(&self.app.default_config);
        self.configs
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::UnknownBench(name.into()))
    }

    /// Fresh topology for `bench`: shared hardware plus the bench's cards.
    pub fn topology(&self, bench: &BenchConfig) -> Topology {
        Topology::new(
            self.gpio.modules.clone(),
            self.gpio.pinout.clone(),
            bench.cards.clone(),
            self.gpio.default_state,
        )
    }

    /// Structural checks. Nothing is corrected; the first problem fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_gpio(&self.gpio)?;
        for bench in &self.configs {
            validate_bench(bench, &self.gpio)
                .map_err(|e| ConfigError::ValidationFailed(format!("bench `{}`: {e}", bench.name)))?;
        }
        self.bench(None)?;
        Ok(())
    }
}

fn validate_gpio(gpio: &GpioSection) -> Result<(), ConfigError> {
    let fail = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::ValidationFailed(msg)) };

    let mut api_addresses = HashSet::new();
    for module in &gpio.modules {
        if !api_addresses.insert(module.api_address) {
            return fail(format!("module address {} is declared twice", module.api_address));
        }
    }

    let mut seen_pins = HashSet::new();
    for group in &gpio.pinout {
        if group.pins.len() > MAX_GROUP_PINS {
            return fail(format!(
                "pinout group for register {} has {} pins (max {MAX_GROUP_PINS})",
                group.register_number,
                group.pins.len()
            ));
        }
        for &pin in &group.pins {
            if !seen_pins.insert(pin) {
                return fail(format!("pin {pin} appears in more than one pinout group"));
            }
        }
        if let Some(module) = gpio
            .modules
            .iter()
            .find(|m| m.register(group.register_number).is_none())
        {
            return fail(format!(
                "module {} has no register {}",
                module.api_address, group.register_number
            ));
        }
    }
    Ok(())
}

fn validate_bench(bench: &BenchConfig, gpio: &GpioSection) -> Result<(), String> {
    let mut card_names = HashSet::new();
    let mut wired: HashSet<GpioRef> = HashSet::new();
    for card in &bench.cards {
        if !card_names.insert(card.card_name.as_str()) {
            return Err(format!("card `{}` is declared twice", card.card_name));
        }
        for pin in &card.pins {
            if !gpio.modules.iter().any(|m| m.api_address == pin.gpio.module) {
                return Err(format!(
                    "pin {}/{} references unknown module {}",
                    card.card_name, pin.number_on_card, pin.gpio.module
                ));
            }
            if !wired.insert(pin.gpio) {
                return Err(format!(
                    "module {} pin {} is wired to more than one card pin",
                    pin.gpio.module, pin.gpio.pin
                ));
            }
        }
    }

    let mut short_names = HashSet::new();
    for command in &bench.commandes {
        if !short_names.insert(command.short_name.as_str()) {
            return Err(format!("command `{}` is declared twice", command.short_name));
        }
    }

    for device in &bench.telnet {
        if device.host.trim().is_empty() {
            return Err(format!("telnet device `{}` has no host", device.name));
        }
    }
    Ok(())
}
