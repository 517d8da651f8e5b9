use std::time::Duration;

use i2cserial_frame::{FrameError, ReplyError};

use crate::state::Fault;

/// Errors returned by bridge transactions.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The target device did not acknowledge its address.
    #[error("address not acknowledged")]
    AddressNak,

    /// The target device rejected a data byte.
    #[error("data byte not acknowledged")]
    DataNak,

    /// The bridge refused the command because the bus was occupied.
    #[error("bus busy")]
    BusBusy,

    /// The bridge detected a stalled bus.
    #[error("bus stalled")]
    BusStalled,

    /// The bridge reported a bus-level timeout.
    #[error("bus timeout reported by bridge")]
    BusTimeout,

    /// No reply from the bridge within the wait window.
    #[error("no response from bridge within {0:?}")]
    Timeout(Duration),

    /// The reply did not fit the receive buffer.
    #[error("receive buffer overflow")]
    BufferOverflow,

    /// The bridge reset in the middle of the transaction.
    #[error("bridge reset during transaction")]
    DeviceReset,

    /// The bridge reported a master transmit failure.
    #[error("master transmit failure")]
    MasterTransmitFailure,

    /// A message does not fit the frame or receive buffer.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The requested transaction shape is not implemented by the bridge.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Address outside the 7-bit range.
    #[error("invalid 7-bit address {0:#04x}")]
    InvalidAddress(u8),

    /// SMBus block length outside 1..=32.
    #[error("invalid SMBus block length {0}")]
    InvalidBlock(usize),

    /// The startup version handshake failed.
    #[error("no bridge device: {0}")]
    NoDevice(String),

    /// Frame encoding failed for a reason other than size.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// The byte transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] i2cserial_transport::TransportError),
}

impl From<FrameError> for BridgeError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::FrameTooLarge { size, max } => BridgeError::MessageTooLarge { size, max },
            other => BridgeError::Frame(other),
        }
    }
}

impl From<ReplyError> for BridgeError {
    fn from(code: ReplyError) -> Self {
        match code {
            ReplyError::AddressNak => BridgeError::AddressNak,
            ReplyError::DataNak => BridgeError::DataNak,
            ReplyError::Overflow => BridgeError::BufferOverflow,
            ReplyError::BusTimeout => BridgeError::BusTimeout,
            ReplyError::Busy => BridgeError::BusBusy,
            ReplyError::Stalled => BridgeError::BusStalled,
            ReplyError::MasterTransmitFailure => BridgeError::MasterTransmitFailure,
        }
    }
}

impl From<Fault> for BridgeError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Reply(code) => code.into(),
            Fault::DeviceReset => BridgeError::DeviceReset,
            Fault::BufferOverflow => BridgeError::BufferOverflow,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
