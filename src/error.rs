//! Unified error types for the test bench core.
//!
//! Every fallible bench operation funnels into [`BenchError`]. Each variant
//! carries a machine-stable kind tag ([`BenchError::kind`]) and an HTTP-style
//! status code ([`BenchError::code`]) so the outer transport layers can turn
//! any failure into a response without inspecting its message.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// A physical register write that the bus transport could not complete.
///
/// The in-memory register and pin state have already been updated when this
/// is reported; the device state is unconfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("write to 0x{address:02x} register 0x{register:02x} failed: {reason}")]
pub struct BusError {
    /// I2C slave address of the expander.
    pub address: u8,
    /// Register address that was being written.
    pub register: u8,
    /// Transport-specific failure description.
    pub reason: String,
}

impl BusError {
    pub fn new(address: u8, register: u8, reason: impl Into<String>) -> Self {
        Self {
            address,
            register,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level bench error
// ---------------------------------------------------------------------------

/// Every resolution, dispatch and bus failure of the bench core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    /// No card with this name in the active configuration.
    #[error("card `{card}` not found")]
    CardNotFound { card: String },

    /// The card exists but has no pin with this on-card name.
    #[error("pin `{pin}` not found on card `{card}`")]
    PinNotFound { card: String, pin: String },

    /// A module pin number that no pinout group contains.
    ///
    /// `internal` is set when the number came from the configuration (a card
    /// pin or a rule) rather than from an API caller.
    #[error("pin {pin} is not mapped in the pinout")]
    PinNotMapped { pin: u8, internal: bool },

    /// No module with this logical (API) address.
    #[error("GPIO module {module} not found")]
    ModuleNotFound { module: u8, internal: bool },

    /// The physical write failed after the logical state was updated.
    #[error("I2C bus error: {0}")]
    Bus(#[from] BusError),

    /// No command with this short name exists anywhere.
    #[error("command `{0}` not found")]
    CommandNotFound(String),

    /// The command exists but its conditions do not currently hold.
    #[error("command `{0}` is forbidden in the current state")]
    CommandForbidden(String),

    /// No Etat category with this name.
    #[error("etat `{0}` not found")]
    EtatNotFound(String),

    /// No bench configuration with this name.
    #[error("configuration `{0}` not found")]
    ConfigurationNotFound(String),

    /// Malformed request arguments (unparsable module, pin or state).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BenchError {
    /// Stable tag identifying the kind of failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CardNotFound { .. } => "CARD_NOT_FOUND",
            Self::PinNotFound { .. } | Self::PinNotMapped { .. } => "PIN_NOT_FOUND",
            Self::ModuleNotFound { .. } => "MODULE_GPIO_NOT_FOUND",
            Self::Bus(_) => "I2C_BUS_ERROR",
            Self::CommandNotFound(_) => "COMMAND_NOT_FOUND",
            Self::CommandForbidden(_) => "COMMAND_FORBIDDEN",
            Self::EtatNotFound(_) => "ETAT_NOT_FOUND",
            Self::ConfigurationNotFound(_) => "CONFIGURATION_NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP-style status code.
    pub fn code(&self) -> u16 {
        match self {
            Self::CardNotFound { .. }
            | Self::PinNotFound { .. }
            | Self::CommandNotFound(_)
            | Self::EtatNotFound(_)
            | Self::ConfigurationNotFound(_) => 404,
            Self::PinNotMapped { internal, .. } | Self::ModuleNotFound { internal, .. } => {
                if *internal { 500 } else { 404 }
            }
            Self::CommandForbidden(_) => 406,
            Self::InvalidRequest(_) => 400,
            Self::Bus(_) => 500,
        }
    }

    /// True when the logical state changed but the device write is unconfirmed.
    pub fn is_bus_fault(&self) -> bool {
        matches!(self, Self::Bus(_))
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Bench-wide `Result` alias.
pub type Result<T> = core::result::Result<T, BenchError>;
