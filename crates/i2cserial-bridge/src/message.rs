use std::fmt;

use i2cserial_frame::SMBUS_BLOCK_MAX;
use serde::Serialize;

use crate::error::{BridgeError, Result};

/// Transfer direction of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

/// Data carried by a [`Message`].
#[derive(Debug)]
pub enum Payload<'a> {
    /// Destination buffer; its length is the number of bytes to read.
    Read(&'a mut [u8]),
    /// Bytes to write.
    Write(&'a [u8]),
}

/// One segment of an I2C transfer.
#[derive(Debug)]
pub struct Message<'a> {
    /// 7-bit target address.
    pub address: u8,
    /// Chain into the next message with a repeated start instead of a stop.
    pub no_stop: bool,
    pub payload: Payload<'a>,
}

impl<'a> Message<'a> {
    /// Read `buf.len()` bytes from `address` into `buf`.
    pub fn read(address: u8, buf: &'a mut [u8]) -> Self {
        Self {
            address,
            no_stop: false,
            payload: Payload::Read(buf),
        }
    }

    /// Write `data` to `address`.
    pub fn write(address: u8, data: &'a [u8]) -> Self {
        Self {
            address,
            no_stop: false,
            payload: Payload::Write(data),
        }
    }

    /// Keep the bus after this message.
    pub fn no_stop(mut self) -> Self {
        self.no_stop = true;
        self
    }

    pub fn direction(&self) -> Direction {
        match self.payload {
            Payload::Read(_) => Direction::Read,
            Payload::Write(_) => Direction::Write,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Read(buf) => buf.len(),
            Payload::Write(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SMBus transaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmbusSize {
    Quick,
    Byte,
    ByteData,
    WordData,
    ProcessCall,
    BlockData,
    I2cBlockData,
    BlockProcessCall,
}

impl SmbusSize {
    pub const ALL: [SmbusSize; 8] = [
        SmbusSize::Quick,
        SmbusSize::Byte,
        SmbusSize::ByteData,
        SmbusSize::WordData,
        SmbusSize::ProcessCall,
        SmbusSize::BlockData,
        SmbusSize::I2cBlockData,
        SmbusSize::BlockProcessCall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SmbusSize::Quick => "quick",
            SmbusSize::Byte => "byte",
            SmbusSize::ByteData => "byte-data",
            SmbusSize::WordData => "word-data",
            SmbusSize::ProcessCall => "process-call",
            SmbusSize::BlockData => "block-data",
            SmbusSize::I2cBlockData => "i2c-block-data",
            SmbusSize::BlockProcessCall => "block-process-call",
        }
    }
}

impl fmt::Display for SmbusSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size of the SMBus data block: count byte, 32 data bytes, one spare.
pub const SMBUS_DATA_LEN: usize = SMBUS_BLOCK_MAX + 2;

/// SMBus data exchanged by [`smbus_transfer`](crate::Connection::smbus_transfer).
///
/// One buffer viewed three ways: a byte, a little-endian word, or a
/// count-prefixed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbusData {
    raw: [u8; SMBUS_DATA_LEN],
}

impl SmbusData {
    pub fn new() -> Self {
        Self {
            raw: [0; SMBUS_DATA_LEN],
        }
    }

    pub fn from_byte(value: u8) -> Self {
        let mut data = Self::new();
        data.set_byte(value);
        data
    }

    pub fn from_word(value: u16) -> Self {
        let mut data = Self::new();
        data.set_word(value);
        data
    }

    pub fn from_block(block: &[u8]) -> Result<Self> {
        let mut data = Self::new();
        data.set_block(block)?;
        Ok(data)
    }

    pub fn byte(&self) -> u8 {
        self.raw[0]
    }

    pub fn set_byte(&mut self, value: u8) {
        self.raw[0] = value;
    }

    pub fn word(&self) -> u16 {
        u16::from_le_bytes([self.raw[0], self.raw[1]])
    }

    pub fn set_word(&mut self, value: u16) {
        self.raw[..2].copy_from_slice(&value.to_le_bytes());
    }

    /// Block contents, without the count byte.
    ///
    /// A count above 32 is clamped.
    pub fn block(&self) -> &[u8] {
        let count = usize::from(self.raw[0]).min(SMBUS_BLOCK_MAX);
        &self.raw[1..=count]
    }

    /// Store a block of 1..=32 bytes and its count.
    pub fn set_block(&mut self, block: &[u8]) -> Result<()> {
        if block.is_empty() || block.len() > SMBUS_BLOCK_MAX {
            return Err(BridgeError::InvalidBlock(block.len()));
        }
        self.raw[0] = block.len() as u8;
        self.raw[1..=block.len()].copy_from_slice(block);
        Ok(())
    }

    /// The count byte followed by the block, as sent on the wire.
    pub(crate) fn counted_block(&self) -> &[u8] {
        let count = usize::from(self.raw[0]).min(SMBUS_BLOCK_MAX);
        &self.raw[..=count]
    }

    /// The whole underlying buffer.
    pub fn as_bytes(&self) -> &[u8; SMBUS_DATA_LEN] {
        &self.raw
    }
}

impl Default for SmbusData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let mut buf = [0u8; 3];
        let read = Message::read(0x50, &mut buf).no_stop();
        assert_eq!(read.direction(), Direction::Read);
        assert_eq!(read.len(), 3);
        assert!(read.no_stop);

        let write = Message::write(0x50, &[]);
        assert_eq!(write.direction(), Direction::Write);
        assert!(write.is_empty());
        assert!(!write.no_stop);
    }

    #[test]
    fn word_is_little_endian() {
        let data = SmbusData::from_word(0xBEEF);
        assert_eq!(&data.as_bytes()[..2], &[0xEF, 0xBE]);
        assert_eq!(data.word(), 0xBEEF);
        assert_eq!(data.byte(), 0xEF);
    }

    #[test]
    fn block_carries_count() {
        let data = SmbusData::from_block(&[7, 8, 9]).unwrap();
        assert_eq!(data.block(), &[7, 8, 9]);
        assert_eq!(data.counted_block(), &[3, 7, 8, 9]);
    }

    #[test]
    fn block_length_bounds() {
        assert!(matches!(
            SmbusData::from_block(&[]),
            Err(BridgeError::InvalidBlock(0))
        ));
        assert!(matches!(
            SmbusData::from_block(&[0; 33]),
            Err(BridgeError::InvalidBlock(33))
        ));
        let full = SmbusData::from_block(&[0xAA; 32]).unwrap();
        assert_eq!(full.block().len(), 32);
    }

    #[test]
    fn oversized_count_is_clamped() {
        let mut data = SmbusData::new();
        data.set_byte(200);
        assert_eq!(data.block().len(), SMBUS_BLOCK_MAX);
    }

    #[test]
    fn size_names() {
        assert_eq!(SmbusSize::BlockData.to_string(), "block-data");
        assert_eq!(
            serde_json::to_string(&SmbusSize::I2cBlockData).unwrap(),
            "\"i2c-block-data\""
        );
        assert_eq!(SmbusSize::ALL.len(), 8);
    }
}
