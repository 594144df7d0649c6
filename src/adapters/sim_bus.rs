//! Simulated expander bus for host runs.
//!
//! Keeps the last byte written to every `(address, register)` pair and a
//! write log. Devices can be marked offline to exercise the bus-fault path.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::app::ports::BusPort;
use crate::error::BusError;

#[derive(Debug, Default, Clone)]
pub struct SimBus {
    registers: BTreeMap<(u8, u8), u8>,
    log: Vec<(u8, u8, u8)>,
    offline: BTreeSet<u8>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `register` of device `address`.
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.registers.get(&(address, register)).copied()
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> &[(u8, u8, u8)] {
        &self.log
    }

    /// Make writes to `address` fail (or succeed again).
    pub fn set_offline(&mut self, address: u8, offline: bool) {
        if offline {
            self.offline.insert(address);
        } else {
            self.offline.remove(&address);
        }
    }
}

impl BusPort for SimBus {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        if self.offline.contains(&address) {
            return Err(BusError::new(address, register, "device offline (simulated)"));
        }
        debug!("sim-bus: 0x{address:02x}[0x{register:02x}] <- 0b{value:08b}");
        self.registers.insert((address, register), value);
        self.log.push((address, register, value));
        Ok(())
    }
}
