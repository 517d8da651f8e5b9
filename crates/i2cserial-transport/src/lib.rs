//! Byte transport abstraction for the i2cserial bridge.
//!
//! The bridge engine needs exactly two primitives from the link to the
//! remote microcontroller:
//! - send one byte ([`SerialTransport::send_byte`])
//! - be told about every byte that arrives ([`ByteSink::on_byte_received`])
//!
//! This is the lowest layer of i2cserial. [`SerialLine`] provides the
//! primitives over a serial port on Unix; tests and other platforms plug in
//! their own [`SerialTransport`] implementations.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::{Result, TransportError};
pub use traits::{ByteSink, SerialTransport};

#[cfg(unix)]
pub use tty::{SerialConfig, SerialLine};
