//! I2C bus adapter.
//!
//! Implements [`BusPort`] over any `embedded-hal` 1.0 I2C master. A
//! register write is a single `[register, value]` transaction, which is
//! what MCP23017-style expanders expect in byte mode.

use embedded_hal::i2c::{Error as _, I2c};

use crate::app::ports::BusPort;
use crate::error::BusError;

/// Expander bus over an `embedded-hal` I2C peripheral.
pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the peripheral back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusPort for I2cBus<I> {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(address, &[register, value])
            .map_err(|e| BusError::new(address, register, format!("{:?}", e.kind())))
    }
}
