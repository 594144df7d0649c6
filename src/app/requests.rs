//! Inbound requests to the bench service.
//!
//! One tagged variant per request kind, validated at the boundary:
//!
//! ```json
//! {"command": "writeToCard", "options": {"cardName": "J1", "numberOnCard": "K1", "state": true}}
//! {"command": "allEtats"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Requests that external adapters can send into the bench core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "command",
    content = "options",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum BenchRequest {
    // ── Reads ───────────────────────────────────────────────
    AllCards,
    Card { card_name: String },
    Pin { card_name: String, number_on_card: String },
    AllModules,
    Module { module: Numeric },
    BancPinout,
    AllEtats,
    Etat { name: String },
    AllCommands,
    AvailableCommands,
    InputStates,
    AllConfigs,
    CurrentConfig,

    // ── Writes ──────────────────────────────────────────────
    WriteToCard {
        card_name: String,
        number_on_card: String,
        state: PinLevel,
    },
    WriteToModule {
        module: Numeric,
        pin: Numeric,
        state: PinLevel,
    },
    SendCommand {
        command_name: String,
        #[serde(default)]
        force: bool,
    },
    UpdateRegisters,
    ChangeConfiguration { configuration_name: String },
}

impl BenchRequest {
    /// Name used as `dataName` in the response.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllCards => "allCards",
            Self::Card { .. } => "card",
            Self::Pin { .. } => "pin",
            Self::AllModules => "allModules",
            Self::Module { .. } => "module",
            Self::BancPinout => "bancPinout",
            Self::AllEtats => "allEtats",
            Self::Etat { .. } => "etat",
            Self::AllCommands => "allCommands",
            Self::AvailableCommands => "availableCommands",
            Self::InputStates => "inputStates",
            Self::AllConfigs => "allConfigs",
            Self::CurrentConfig => "currentConfig",
            Self::WriteToCard { .. } => "writeToCard",
            Self::WriteToModule { .. } => "writeToModule",
            Self::SendCommand { .. } => "sendCommand",
            Self::UpdateRegisters => "updateRegisters",
            Self::ChangeConfiguration { .. } => "changeConfiguration",
        }
    }
}

/// A pin level given as a JSON boolean or as `"true"` / `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinLevel {
    Bool(bool),
    Text(String),
}

impl PinLevel {
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Text(t) => match t.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(BenchError::InvalidRequest(format!(
                    "state `{other}` is not true/false"
                ))),
            },
        }
    }
}

/// A module address or pin number given as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(u8),
    Text(String),
}

impl Numeric {
    pub fn to_u8(&self, what: &str) -> Result<u8> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(t) => t
                .trim()
                .parse()
                .map_err(|_| BenchError::InvalidRequest(format!("{what} `{t}` is not a number"))),
        }
    }
}
