use std::sync::Arc;

use crate::error::Result;

/// Receives bytes as they arrive from the remote device.
///
/// Called from the transport's receive context, one byte per call, in wire
/// order. Implementations must return quickly: no blocking, no I/O.
pub trait ByteSink: Send + Sync {
    fn on_byte_received(&self, byte: u8);
}

impl<F> ByteSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_byte_received(&self, byte: u8) {
        self(byte)
    }
}

/// A full-duplex byte link to the bridge microcontroller.
pub trait SerialTransport: Send + Sync {
    /// Transmit a single byte.
    fn send_byte(&self, byte: u8) -> Result<()>;

    /// Transmit a sequence of bytes, one [`send_byte`](Self::send_byte) at a time.
    ///
    /// Stops at the first failing byte.
    fn send(&self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Start delivering received bytes to `sink`.
    ///
    /// Only one sink may be attached at a time.
    fn attach(&mut self, sink: Arc<dyn ByteSink>) -> Result<()>;

    /// Stop delivering received bytes. Idempotent.
    fn detach(&mut self);

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "serial"
    }
}
