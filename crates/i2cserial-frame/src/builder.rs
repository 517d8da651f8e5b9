use bytes::BytesMut;
use tracing::trace;

use crate::codec;
use crate::error::{FrameError, Result};

/// Default maximum encoded frame size in bytes.
pub const DEFAULT_MAX_FRAME: usize = 512;

/// Configuration for frame building.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum size of one outgoing frame, escapes included. Default: 512.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME,
        }
    }
}

/// Assembles one outgoing frame in a reusable buffer.
///
/// Pieces are appended with the builder methods, then [`finish`](Self::finish)
/// checks the frame against [`FrameConfig::max_frame_len`] and hands out the
/// bytes. Nothing is sent from here.
#[derive(Debug)]
pub struct FrameBuilder {
    buf: BytesMut,
    config: FrameConfig,
}

impl FrameBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a builder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.max_frame_len),
            config,
        }
    }

    /// Discard everything built so far.
    pub fn clear(&mut self) -> &mut Self {
        self.buf.clear();
        self
    }

    /// Append a read command.
    pub fn read(&mut self, address: u8, length: u8, no_stop: bool) -> &mut Self {
        if no_stop {
            codec::encode_read_no_stop(address, length, &mut self.buf);
        } else {
            codec::encode_read(address, length, &mut self.buf);
        }
        self
    }

    /// Append a write header.
    pub fn write(&mut self, address: u8, no_stop: bool) -> &mut Self {
        if no_stop {
            codec::encode_write_no_stop(address, &mut self.buf);
        } else {
            codec::encode_write(address, &mut self.buf);
        }
        self
    }

    /// Append escape-stuffed payload bytes.
    pub fn data(&mut self, data: &[u8]) -> &mut Self {
        codec::escape(data, &mut self.buf);
        self
    }

    /// Append the end-of-transmission footer.
    pub fn footer(&mut self) -> &mut Self {
        codec::encode_footer(&mut self.buf);
        self
    }

    /// Append a firmware version request.
    pub fn version_request(&mut self) -> &mut Self {
        codec::encode_version_request(&mut self.buf);
        self
    }

    /// Append a reset command.
    pub fn reset(&mut self) -> &mut Self {
        codec::encode_reset(&mut self.buf);
        self
    }

    /// Validate the frame size and return the encoded bytes.
    pub fn finish(&self) -> Result<&[u8]> {
        if self.buf.len() > self.config.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                size: self.buf.len(),
                max: self.config.max_frame_len,
            });
        }
        trace!(len = self.buf.len(), "frame built");
        Ok(&self.buf[..])
    }

    /// Bytes currently in the frame.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been appended since the last clear.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current builder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
