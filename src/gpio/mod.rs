//! Register engine: the only write path into module registers.
//!
//! Every pin write is a read-modify-write on one register byte of one
//! module:
//!
//! ```text
//!  (card, pin) ──▶ GpioRef ──▶ BitLocation ──▶ registers[r] ±= 1 << bit ──▶ BusPort
//!  (module, pin) ─────────────┘
//! ```
//!
//! A write whose bit already holds the requested level is a no-op: no
//! register byte, pin state or bus write is touched. Otherwise the logical
//! pin state and the register byte are updated together and the full byte
//! is handed to the bus. A bus failure is returned as
//! [`BenchError::Bus`] and does not roll the in-memory state back.

use log::{debug, info, warn};

use crate::app::ports::BusPort;
use crate::error::{BenchError, Result};
use crate::topology::{BitLocation, GpioRef, Topology};

/// Result of a successful write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The bit already held the requested level. Nothing was touched.
    Unchanged,
    /// The register byte changed and was written to the bus.
    Written {
        /// I2C address of the module.
        address: u8,
        /// Bus address of the GPIO data register.
        register: u8,
        /// Full register byte after the write.
        value: u8,
    },
}

impl WriteOutcome {
    pub fn is_unchanged(self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// True when bit `selector` of `register` already holds `value`.
pub const fn bit_matches(register: u8, selector: u8, value: bool) -> bool {
    let check = if value { register } else { !register };
    check & selector != 0
}

/// Register byte after moving the bit selected by `selector` to `value`.
///
/// Only valid when the bit is known to hold `!value`; with that guarantee
/// adding or subtracting the selector is a masked set or clear.
const fn apply_bit(register: u8, selector: u8, value: bool) -> u8 {
    if value {
        register.wrapping_add(selector)
    } else {
        register.wrapping_sub(selector)
    }
}

// ───────────────────────────────────────────────────────────────
// Public write paths
// ───────────────────────────────────────────────────────────────

/// Write a card pin, resolved by card name and on-card pin name.
///
/// Only the resolved card pin's logical state is updated.
pub fn write_card_pin(
    topology: &mut Topology,
    bus: &mut impl BusPort,
    card: &str,
    number_on_card: &str,
    value: bool,
) -> Result<WriteOutcome> {
    let gpio = topology.pin(card, number_on_card)?.gpio;
    // Card pins come from configuration: a dangling reference is a fault.
    topology.module_mut(gpio.module, true)?;
    let loc = topology.locate(gpio.pin, true)?;

    let Some(new_value) = prepare(topology, gpio, loc, value, true)? else {
        debug!("gpio: {card}/{number_on_card} already {value}, skipped");
        return Ok(WriteOutcome::Unchanged);
    };
    topology.pin_mut(card, number_on_card)?.state = Some(value);
    commit(topology, bus, gpio, loc, new_value, true)
}

/// Write a module pin, resolved by logical module address and pin number.
///
/// Every card pin wired to `(module, pin)` has its logical state updated.
pub fn write_module_pin(
    topology: &mut Topology,
    bus: &mut impl BusPort,
    module: u8,
    pin: u8,
    value: bool,
) -> Result<WriteOutcome> {
    let gpio = GpioRef { module, pin };
    let loc = topology.locate(pin, false)?;
    topology.module_mut(module, false)?;

    let Some(new_value) = prepare(topology, gpio, loc, value, false)? else {
        debug!("gpio: module {module} pin {pin} already {value}, skipped");
        return Ok(WriteOutcome::Unchanged);
    };
    for card_pin in topology.pins_wired_to_mut(gpio) {
        card_pin.state = Some(value);
    }
    commit(topology, bus, gpio, loc, new_value, false)
}

// ───────────────────────────────────────────────────────────────
// Startup
// ───────────────────────────────────────────────────────────────

/// Write each group's direction byte to every module.
///
/// Stops at the first bus failure.
pub fn setup_modules(topology: &Topology, bus: &mut impl BusPort) -> Result<()> {
    for module in topology.modules() {
        for group in topology.pinout() {
            bus.write_register(module.hardware_address, group.iodir_register, group.direction)?;
        }
        info!(
            "gpio: module {} (0x{:02x}) direction registers configured",
            module.api_address, module.hardware_address
        );
    }
    Ok(())
}

/// Bring every card pin to its initial level.
///
/// Pins without an explicit state take the configured default, then each
/// pin goes through the normal card write path, so pins already at their
/// level cost nothing.
pub fn initialise_pins(topology: &mut Topology, bus: &mut impl BusPort) -> Result<usize> {
    let default = topology.default_state();
    let targets: Vec<(String, String, bool)> = topology
        .cards()
        .iter()
        .flat_map(|card| {
            card.pins.iter().map(|pin| {
                (
                    card.card_name.clone(),
                    pin.number_on_card.clone(),
                    pin.state.unwrap_or(default),
                )
            })
        })
        .collect();

    let mut written = 0;
    for (card, pin, level) in targets {
        topology.pin_mut(&card, &pin)?.state = Some(level);
        if !write_card_pin(topology, bus, &card, &pin, level)?.is_unchanged() {
            written += 1;
        }
    }
    info!("gpio: pins initialised ({written} register writes)");
    Ok(written)
}

// ───────────────────────────────────────────────────────────────
// Internal
// ───────────────────────────────────────────────────────────────

/// New register byte, or `None` when the write is a no-op.
fn prepare(
    topology: &mut Topology,
    gpio: GpioRef,
    loc: BitLocation,
    value: bool,
    internal: bool,
) -> Result<Option<u8>> {
    let module = topology.module_mut(gpio.module, internal)?;
    let current = module
        .register(loc.register)
        .ok_or(BenchError::ModuleNotFound {
            module: gpio.module,
            internal: true,
        })?;
    if bit_matches(current, loc.selector(), value) {
        return Ok(None);
    }
    Ok(Some(apply_bit(current, loc.selector(), value)))
}

fn commit(
    topology: &mut Topology,
    bus: &mut impl BusPort,
    gpio: GpioRef,
    loc: BitLocation,
    new_value: u8,
    internal: bool,
) -> Result<WriteOutcome> {
    let module = topology.module_mut(gpio.module, internal)?;
    module.registers[loc.register] = new_value;
    let address = module.hardware_address;

    match bus.write_register(address, loc.gpio_register, new_value) {
        Ok(()) => {
            info!(
                "gpio: module {} pin {} -> register 0x{:02x} = 0b{:08b}",
                gpio.module, gpio.pin, loc.gpio_register, new_value
            );
            Ok(WriteOutcome::Written {
                address,
                register: loc.gpio_register,
                value: new_value,
            })
        }
        Err(e) => {
            warn!("gpio: {e} (logical state kept)");
            Err(e.into())
        }
    }
}
