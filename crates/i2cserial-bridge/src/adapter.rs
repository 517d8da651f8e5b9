use serde::Serialize;

use crate::error::Result;
use crate::message::{Direction, Message, SmbusData, SmbusSize};

/// Supported transaction shapes of an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Functionality {
    /// Plain multi-message I2C transfers.
    pub i2c: bool,
    /// Repeated-start chaining between messages.
    pub no_stop: bool,
    /// SMBus shapes accepted by `smbus_transfer`.
    pub smbus: Vec<SmbusSize>,
}

impl Functionality {
    pub fn supports(&self, size: SmbusSize) -> bool {
        self.smbus.contains(&size)
    }
}

/// Bus-level operations offered by an I2C adapter.
pub trait I2cAdapter {
    /// Execute `messages` in order. Returns the number of payload bytes moved.
    fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize>;

    /// Execute one SMBus transaction.
    fn smbus_transfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        data: &mut SmbusData,
    ) -> Result<()>;

    fn functionality(&self) -> Functionality;
}
