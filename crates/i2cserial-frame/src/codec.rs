use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::wire::{
    CMD_EOT, CMD_READ, CMD_READ_NO_STOP, CMD_RESET, CMD_VERSION, CMD_WRITE, CMD_WRITE_NO_STOP,
    ESCAPE,
};

/// Append `byte`, doubled if it is the escape value.
pub fn escape_byte(byte: u8, dst: &mut BytesMut) {
    if byte == ESCAPE {
        dst.put_slice(&[ESCAPE, ESCAPE]);
    } else {
        dst.put_u8(byte);
    }
}

/// Append every byte of `data`, escape-stuffed.
pub fn escape(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(escaped_len(data));
    for &byte in data {
        escape_byte(byte, dst);
    }
}

/// Wire size of `data` after escape-stuffing.
pub fn escaped_len(data: &[u8]) -> usize {
    data.len() + data.iter().filter(|&&byte| byte == ESCAPE).count()
}

/// Undo [`escape`].
///
/// Every escape byte in `src` must be immediately followed by a second one.
pub fn unescape(src: &[u8]) -> Result<Bytes> {
    let mut out = BytesMut::with_capacity(src.len());
    let mut iter = src.iter().enumerate();
    while let Some((offset, &byte)) = iter.next() {
        if byte == ESCAPE {
            match iter.next() {
                Some((_, &ESCAPE)) => {}
                _ => return Err(FrameError::InvalidEscape { offset }),
            }
        }
        out.put_u8(byte);
    }
    Ok(out.freeze())
}

fn encode_command(command: u8, dst: &mut BytesMut) {
    dst.put_slice(&[ESCAPE, command]);
}

fn encode_addressed(command: u8, address: u8, dst: &mut BytesMut) {
    encode_command(command, dst);
    dst.put_u8(address & 0x7F);
}

/// Encode a read of `length` bytes from `address`.
///
/// Wire format: `ESC 'r' addr len`, with `len` escape-stuffed.
pub fn encode_read(address: u8, length: u8, dst: &mut BytesMut) {
    encode_addressed(CMD_READ, address, dst);
    escape_byte(length, dst);
}

/// Encode a read that keeps the bus for the next command (repeated start).
pub fn encode_read_no_stop(address: u8, length: u8, dst: &mut BytesMut) {
    encode_addressed(CMD_READ_NO_STOP, address, dst);
    escape_byte(length, dst);
}

/// Encode the header of a write to `address`.
///
/// The caller appends escape-stuffed data and, unless the write chains into a
/// read, [`encode_footer`].
pub fn encode_write(address: u8, dst: &mut BytesMut) {
    encode_addressed(CMD_WRITE, address, dst);
}

/// Encode the header of a write that keeps the bus for the next command.
pub fn encode_write_no_stop(address: u8, dst: &mut BytesMut) {
    encode_addressed(CMD_WRITE_NO_STOP, address, dst);
}

/// Encode a write header followed by escape-stuffed `data`.
pub fn encode_write_block(address: u8, data: &[u8], dst: &mut BytesMut) {
    encode_write(address, dst);
    escape(data, dst);
}

/// [`encode_write_block`] with a repeated start instead of a stop.
pub fn encode_write_block_no_stop(address: u8, data: &[u8], dst: &mut BytesMut) {
    encode_write_no_stop(address, dst);
    escape(data, dst);
}

/// Encode the end-of-transmission marker that closes a write.
pub fn encode_footer(dst: &mut BytesMut) {
    encode_command(CMD_EOT, dst);
}

/// Encode a firmware version request.
pub fn encode_version_request(dst: &mut BytesMut) {
    encode_command(CMD_VERSION, dst);
}

/// Encode a bridge reset.
pub fn encode_reset(dst: &mut BytesMut) {
    encode_command(CMD_RESET, dst);
}
