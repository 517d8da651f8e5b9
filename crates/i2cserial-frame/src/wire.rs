//! Wire constants and reply classification.
//!
//! Command bytes follow an [`ESCAPE`] in the host-to-device stream; reply
//! codes follow an [`ESCAPE`] in the device-to-host stream. A few values are
//! shared between the two directions with different meanings (`'n'`, `'N'`).

/// Marks the start of a command or reply. Doubled when it is payload data.
pub const ESCAPE: u8 = 0x1B;

/// Read, releasing the bus afterwards.
pub const CMD_READ: u8 = b'r';
/// Read, chaining into the next command with a repeated start.
pub const CMD_READ_NO_STOP: u8 = b'n';
/// Write, releasing the bus after the footer.
pub const CMD_WRITE: u8 = b'S';
/// Write, chaining into the next command with a repeated start.
pub const CMD_WRITE_NO_STOP: u8 = b'N';
/// End of transmission. Terminates the data of a write.
pub const CMD_EOT: u8 = 0x04;
/// Request the 4-byte firmware version.
pub const CMD_VERSION: u8 = b'v';
/// Reset the bridge and abandon whatever it was doing.
pub const CMD_RESET: u8 = b'z';
/// Unsolicited wakeup announcement.
pub const CMD_WAKEUP: u8 = b'+';

pub const REPLY_ADDRESS_NAK: u8 = b'N';
pub const REPLY_DATA_NAK: u8 = b'n';
pub const REPLY_OVERFLOW: u8 = b'o';
pub const REPLY_BUS_TIMEOUT: u8 = b't';
pub const REPLY_BUSY: u8 = b'c';
pub const REPLY_CANCELLED: u8 = b'C';
pub const REPLY_STALLED: u8 = b'x';
pub const REPLY_MASTER_TRANSMIT_FAILURE: u8 = b'F';
pub const REPLY_RESET: u8 = b'z';
pub const REPLY_VERSION: u8 = b'v';
pub const REPLY_WAKEUP: u8 = b'+';

/// Number of bytes in a firmware version reply.
pub const VERSION_LEN: usize = 4;

/// Largest read a single read command can request.
pub const MAX_READ_LEN: usize = u8::MAX as usize;

/// Read length value asking the bridge for an SMBus block read, where the
/// first returned byte is the count of bytes that follow.
pub const READ_LENGTH_PREFIXED: u8 = 0;

/// Largest SMBus block transfer.
pub const SMBUS_BLOCK_MAX: usize = 32;

/// An error code reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyError {
    AddressNak,
    DataNak,
    Overflow,
    BusTimeout,
    Busy,
    Stalled,
    MasterTransmitFailure,
}

/// Meaning of the byte that follows an escape in the reply stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A doubled escape: literal `0x1B` data.
    Escape,
    /// The sub-command failed.
    Nak(ReplyError),
    /// The bridge reset, either on request or because its watchdog fired.
    Reset,
    /// A firmware version follows.
    Version,
    /// The bridge announced it is awake. Informational.
    Wakeup,
    /// A write sub-command completed.
    WriteAck(u8),
    /// A read sub-command completed.
    ReadAck(u8),
    /// Not part of the protocol.
    Unknown(u8),
}

impl Reply {
    /// Classify the byte following an escape.
    ///
    /// Error codes take precedence over the generic upper/lowercase ack rule,
    /// so `'N'` is always an address NAK, never a write ack.
    pub fn classify(byte: u8) -> Self {
        match byte {
            ESCAPE => Reply::Escape,
            REPLY_ADDRESS_NAK => Reply::Nak(ReplyError::AddressNak),
            REPLY_DATA_NAK => Reply::Nak(ReplyError::DataNak),
            REPLY_OVERFLOW => Reply::Nak(ReplyError::Overflow),
            REPLY_BUS_TIMEOUT => Reply::Nak(ReplyError::BusTimeout),
            REPLY_BUSY | REPLY_CANCELLED => Reply::Nak(ReplyError::Busy),
            REPLY_STALLED => Reply::Nak(ReplyError::Stalled),
            REPLY_MASTER_TRANSMIT_FAILURE => Reply::Nak(ReplyError::MasterTransmitFailure),
            REPLY_RESET => Reply::Reset,
            REPLY_VERSION => Reply::Version,
            REPLY_WAKEUP => Reply::Wakeup,
            b'A'..=b'Z' => Reply::WriteAck(byte),
            b'a'..=b'z' => Reply::ReadAck(byte),
            other => Reply::Unknown(other),
        }
    }
}

/// Returns a human-readable name for a command byte.
pub fn command_name(command: u8) -> &'static str {
    match command {
        CMD_READ => "READ",
        CMD_READ_NO_STOP => "READ_NO_STOP",
        CMD_WRITE => "WRITE",
        CMD_WRITE_NO_STOP => "WRITE_NO_STOP",
        CMD_EOT => "EOT",
        CMD_VERSION => "VERSION",
        CMD_RESET => "RESET",
        CMD_WAKEUP => "WAKEUP",
        _ => "UNKNOWN",
    }
}
