//! Escaped command framing for the i2cserial wire protocol.
//!
//! Every command to the bridge microcontroller starts with the escape byte
//! (`0x1B`) followed by a one-byte command. Payload bytes that happen to equal
//! the escape byte are doubled on the wire.
//!
//! ```text
//! read       ESC 'r' addr len
//! write      ESC 'S' addr data.. ESC EOT
//! version    ESC 'v'
//! reset      ESC 'z'
//! ```
//!
//! Replies travel the same way: raw data bytes, with `ESC <code>` marking
//! acknowledgements and errors. See [`Reply`] for the classification.

pub mod builder;
pub mod codec;
pub mod error;
pub mod wire;

pub use builder::{FrameBuilder, FrameConfig, DEFAULT_MAX_FRAME};
pub use codec::{
    encode_footer, encode_read, encode_read_no_stop, encode_reset, encode_version_request,
    encode_write, encode_write_block, encode_write_block_no_stop, encode_write_no_stop, escape,
    escape_byte, escaped_len, unescape,
};
pub use error::{FrameError, Result};
pub use wire::{Reply, ReplyError, ESCAPE, MAX_READ_LEN, SMBUS_BLOCK_MAX, VERSION_LEN};
