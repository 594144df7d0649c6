//! Topology store: cards, pins, modules and the pinout table.
//!
//! The shape of the topology is fixed once loaded: cards, modules and
//! pinout groups never appear or disappear at runtime. Only pin states and
//! register bytes change, and only through the register engine in
//! [`crate::gpio`].
//!
//! Lookups are linear scans; a bench has a handful of modules and a few
//! dozen pins.

pub mod model;

use crate::error::{BenchError, Result};

pub use model::{BitLocation, Card, CardPin, GpioModule, GpioRef, MAX_GROUP_PINS, PinoutGroup};

/// Owned graph of the bench hardware.
#[derive(Debug, Clone)]
pub struct Topology {
    modules: Vec<GpioModule>,
    pinout: Vec<PinoutGroup>,
    cards: Vec<Card>,
    default_state: bool,
}

impl Topology {
    pub fn new(
        modules: Vec<GpioModule>,
        pinout: Vec<PinoutGroup>,
        cards: Vec<Card>,
        default_state: bool,
    ) -> Self {
        Self {
            modules,
            pinout,
            cards,
            default_state,
        }
    }

    // ── Cards ─────────────────────────────────────────────────

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, name: &str) -> Result<&Card> {
        self.cards
            .iter()
            .find(|c| c.card_name == name)
            .ok_or_else(|| BenchError::CardNotFound { card: name.into() })
    }

    pub fn pin(&self, card: &str, number_on_card: &str) -> Result<&CardPin> {
        self.card(card)?
            .pins
            .iter()
            .find(|p| p.number_on_card == number_on_card)
            .ok_or_else(|| BenchError::PinNotFound {
                card: card.into(),
                pin: number_on_card.into(),
            })
    }

    pub(crate) fn pin_mut(&mut self, card: &str, number_on_card: &str) -> Result<&mut CardPin> {
        let card_ref = self
            .cards
            .iter_mut()
            .find(|c| c.card_name == card)
            .ok_or_else(|| BenchError::CardNotFound { card: card.into() })?;
        card_ref
            .pins
            .iter_mut()
            .find(|p| p.number_on_card == number_on_card)
            .ok_or_else(|| BenchError::PinNotFound {
                card: card.into(),
                pin: number_on_card.into(),
            })
    }

    /// Live logical level of a card pin.
    pub fn pin_level(&self, card: &str, number_on_card: &str) -> Result<bool> {
        self.pin(card, number_on_card).map(CardPin::level)
    }

    /// Every card pin wired to `(module, pin)`, across all cards.
    pub(crate) fn pins_wired_to_mut(
        &mut self,
        gpio: GpioRef,
    ) -> impl Iterator<Item = &mut CardPin> + '_ {
        self.cards
            .iter_mut()
            .flat_map(|c| c.pins.iter_mut())
            .filter(move |p| p.gpio == gpio)
    }

    // ── Modules ───────────────────────────────────────────────

    pub fn modules(&self) -> &[GpioModule] {
        &self.modules
    }

    /// Module by logical address, as requested by an API caller.
    pub fn module(&self, api_address: u8) -> Result<&GpioModule> {
        self.modules
            .iter()
            .find(|m| m.api_address == api_address)
            .ok_or(BenchError::ModuleNotFound {
                module: api_address,
                internal: false,
            })
    }

    pub(crate) fn module_mut(&mut self, api_address: u8, internal: bool) -> Result<&mut GpioModule> {
        self.modules
            .iter_mut()
            .find(|m| m.api_address == api_address)
            .ok_or(BenchError::ModuleNotFound {
                module: api_address,
                internal,
            })
    }

    // ── Pinout ────────────────────────────────────────────────

    pub fn pinout(&self) -> &[PinoutGroup] {
        &self.pinout
    }

    /// Locate a module pin number in the register file.
    pub fn locate(&self, pin: u8, internal: bool) -> Result<BitLocation> {
        let group = self
            .pinout
            .iter()
            .find(|g| g.pins.contains(&pin))
            .ok_or(BenchError::PinNotMapped { pin, internal })?;
        // Bits past the register width only exist in unvalidated pinouts.
        let bit = group
            .bit_of(pin)
            .filter(|&bit| usize::from(bit) < MAX_GROUP_PINS)
            .ok_or(BenchError::PinNotMapped { pin, internal: true })?;
        Ok(BitLocation {
            register: group.register_number,
            gpio_register: group.gpio_register,
            bit,
        })
    }

    // ── Defaults ──────────────────────────────────────────────

    /// Level applied at startup to pins without an explicit initial state.
    pub fn default_state(&self) -> bool {
        self.default_state
    }
}
