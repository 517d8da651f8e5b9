use std::fmt;
use std::io;

use i2cserial_bridge::BridgeError;
use i2cserial_transport::TransportError;
use serialport::ErrorKind as SerialErrorKind;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NO_DEVICE: i32 = 69;
pub const TIMEOUT: i32 = 124;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::NotFound => NO_DEVICE,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => TRANSPORT_ERROR,
    }
}

fn serial_code(kind: SerialErrorKind) -> i32 {
    match kind {
        SerialErrorKind::NoDevice => NO_DEVICE,
        // Rejected settings, such as a baud rate the port cannot drive.
        SerialErrorKind::InvalidInput => USAGE,
        SerialErrorKind::Io(kind) => io_code(kind),
        _ => TRANSPORT_ERROR,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Open { source, .. }
        | TransportError::Configure { source, .. }
        | TransportError::Serial(source) => serial_code(source.kind()),
        TransportError::Io(source) => io_code(source.kind()),
        TransportError::AlreadyAttached | TransportError::Shutdown => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Transport(err) => transport_error(context, err),
        BridgeError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        BridgeError::NoDevice(_) => CliError::new(NO_DEVICE, format!("{context}: {err}")),
        BridgeError::Unsupported(_) => CliError::usage(format!("{context}: {err}")),
        BridgeError::MessageTooLarge { .. }
        | BridgeError::InvalidAddress(_)
        | BridgeError::InvalidBlock(_)
        | BridgeError::Frame(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}
