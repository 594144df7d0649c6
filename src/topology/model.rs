//! Static description of the bench hardware as loaded from configuration.
//!
//! Field names on the wire follow the bench configuration file
//! (`API_Address`, `NumberOnCard`, `register_number`, ...).

use heapless::Vec as FixedVec;
use serde::{Deserialize, Serialize};

/// Maximum number of register bytes a single expander exposes.
pub const MAX_REGISTERS: usize = 8;

/// A register byte holds at most eight pins.
pub const MAX_GROUP_PINS: usize = 8;

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// A physical I2C GPIO expander.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioModule {
    /// Logical address used by cards and API callers.
    #[serde(rename = "API_Address")]
    pub api_address: u8,
    /// I2C slave address on the bus.
    #[serde(rename = "address", with = "hex_byte")]
    pub hardware_address: u8,
    /// Last written value of every output register, indexed by register number.
    pub registers: FixedVec<u8, MAX_REGISTERS>,
}

impl GpioModule {
    /// Current value of register `index`, if the module has it.
    pub fn register(&self, index: usize) -> Option<u8> {
        self.registers.get(index).copied()
    }
}

// ---------------------------------------------------------------------------
// Pinout
// ---------------------------------------------------------------------------

/// One register's worth of pins, shared by every module of the bench.
///
/// The position of a pin inside `pins` is its bit index (0 = LSB).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinoutGroup {
    pub pins: Vec<u8>,
    pub register_number: usize,
    /// Bus address of the GPIO data register (e.g. `"0x12"`).
    #[serde(with = "hex_byte")]
    pub gpio_register: u8,
    /// Bus address of the direction register (e.g. `"0x00"`).
    #[serde(with = "hex_byte")]
    pub iodir_register: u8,
    /// Byte written to the direction register at setup. `0x00` = all outputs.
    #[serde(default)]
    pub direction: u8,
}

impl PinoutGroup {
    /// Bit index of `pin` inside this group.
    pub fn bit_of(&self, pin: u8) -> Option<u8> {
        self.pins.iter().position(|&p| p == pin).map(|i| i as u8)
    }
}

/// Where a module pin lives inside a module's register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLocation {
    /// Index into [`GpioModule::registers`].
    pub register: usize,
    /// Bus address of the GPIO data register for this group.
    pub gpio_register: u8,
    /// Bit index inside the register byte.
    pub bit: u8,
}

impl BitLocation {
    pub const fn selector(self) -> u8 {
        1 << self.bit
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Physical pin reference: which module, which pin number on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpioRef {
    #[serde(rename = "Module")]
    pub module: u8,
    #[serde(rename = "Pin")]
    pub pin: u8,
}

/// A named pin on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPin {
    #[serde(rename = "NumberOnCard")]
    pub number_on_card: String,
    #[serde(rename = "GPIO")]
    pub gpio: GpioRef,
    /// Last known logical level. `None` until initialised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
}

impl CardPin {
    /// Logical level, treating an uninitialised pin as low.
    pub fn level(&self) -> bool {
        self.state.unwrap_or(false)
    }
}

/// A named group of pins (typically a connector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "cardName")]
    pub card_name: String,
    #[serde(default)]
    pub pins: Vec<CardPin>,
}

// ---------------------------------------------------------------------------
// Hex-string register addresses
// ---------------------------------------------------------------------------

/// `"0x12"` / `"12"` (hex) on the wire, `u8` in memory.
pub(crate) mod hex_byte {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{value:02x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("`{raw}` is not a hex byte")))
    }

    pub fn parse(raw: &str) -> Option<u8> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u8::from_str_radix(digits, 16).ok()
    }
}
