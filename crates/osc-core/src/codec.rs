//! OSC 1.0 binary codec
//!
//! Every OSC value is aligned to 32 bits on the wire:
//! ```text
//! ┌──────────────┬───────────────────────────────────────────────────┐
//! │ string       │ bytes ++ NUL ++ 0-3 NUL padding                   │
//! │ blob         │ u32 length n ++ n bytes ++ 0-3 NUL padding        │
//! │ int32/float32│ 4 bytes big-endian                                │
//! │ int64/float64│ 8 bytes big-endian                                │
//! │ time tag     │ 8 bytes big-endian (seconds << 32 | fraction)     │
//! └──────────────┴───────────────────────────────────────────────────┘
//! ```
//!
//! A packet starts with `/` (message) or `#` (bundle) and its total length
//! is always a multiple of 4.

use crate::{Bundle, Error, Message, Packet, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Maximum bundle nesting accepted by [`decode_packet`]
pub const MAX_BUNDLE_DEPTH: usize = 32;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Decode a received buffer into a [`Packet`]
///
/// This is the single entry point for transports: the buffer must be a
/// non-empty multiple of 4 bytes and start with `/` or `#`.
pub fn decode_packet(bytes: &[u8]) -> Result<Packet> {
    decode_packet_at_depth(bytes, 0)
}

/// Encode a packet to its wire representation
#[inline]
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    packet.marshal()
}

pub(crate) fn decode_packet_at_depth(bytes: &[u8], depth: usize) -> Result<Packet> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(Error::InvalidFraming(bytes.len()));
    }

    match bytes[0] {
        b'/' => Message::unmarshal(bytes).map(Packet::Message),
        b'#' => Bundle::unmarshal_at_depth(bytes, depth).map(Packet::Bundle),
        other => Err(Error::UnrecognizedPacket(other)),
    }
}

// ============================================================================
// PADDING
// ============================================================================

/// Round a length up to the next multiple of 4
#[inline(always)]
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !0x03
}

/// Append zero bytes until the buffer length is a multiple of 4
///
/// An empty buffer stays empty.
pub fn pad_to_32_bits(buf: &mut BytesMut) {
    let len = buf.len();
    put_padding(buf, len);
}

#[inline(always)]
fn put_padding(buf: &mut BytesMut, written: usize) {
    buf.put_bytes(0, padded_len(written) - written);
}

// ============================================================================
// STRINGS
// ============================================================================

/// Write a NUL-terminated string padded to a 4-byte boundary
///
/// Strings containing a NUL byte cannot be represented and are rejected.
pub fn encode_string(buf: &mut BytesMut, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() >= u32::MAX as usize {
        return Err(Error::PayloadTooLarge(bytes.len()));
    }
    if bytes.contains(&0) {
        return Err(Error::MalformedData(format!(
            "string {:?} contains a NUL byte",
            s
        )));
    }

    buf.reserve(padded_len(bytes.len() + 1));
    buf.extend_from_slice(bytes);
    buf.put_u8(0);
    put_padding(buf, bytes.len() + 1);
    Ok(())
}

/// Read a padded OSC string, verifying that every padding byte is zero
pub fn decode_string(buf: &mut &[u8]) -> Result<String> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedData("string is not NUL-terminated".to_string()))?;

    let consumed = nul + 1;
    let total = padded_len(consumed);
    if buf.len() < total {
        return Err(Error::MalformedData(format!(
            "string padding truncated: need {} bytes, have {}",
            total,
            buf.len()
        )));
    }
    if buf[consumed..total].iter().any(|&b| b != 0) {
        return Err(Error::MalformedData(
            "non-zero byte in string padding".to_string(),
        ));
    }

    let s = std::str::from_utf8(&buf[..nul])
        .map_err(|e| Error::MalformedData(format!("string is not valid UTF-8: {}", e)))?
        .to_string();

    buf.advance(total);
    Ok(s)
}

// ============================================================================
// BLOBS
// ============================================================================

/// Write a length-prefixed blob padded to a 4-byte boundary
pub fn encode_blob(buf: &mut BytesMut, data: &[u8]) -> Result<()> {
    if data.len() > i32::MAX as usize {
        return Err(Error::PayloadTooLarge(data.len()));
    }

    buf.reserve(4 + padded_len(data.len()));
    buf.put_u32(data.len() as u32);
    buf.extend_from_slice(data);
    put_padding(buf, data.len());
    Ok(())
}

/// Read a length-prefixed blob, consuming its padding
pub fn decode_blob(buf: &mut &[u8]) -> Result<Bytes> {
    let len = read_u32(buf)? as usize;
    if len == 0 {
        return Ok(Bytes::new());
    }

    let total = padded_len(len);
    if buf.len() < total {
        return Err(Error::MalformedData(format!(
            "blob truncated: declared {} bytes, {} available",
            len,
            buf.len()
        )));
    }

    let data = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(total);
    Ok(data)
}

// ============================================================================
// FIXED-WIDTH READS
// ============================================================================

#[inline]
fn ensure(buf: &&[u8], needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(Error::MalformedData(format!(
            "unexpected end of data: need {} bytes, have {}",
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

#[inline]
pub(crate) fn read_u32(buf: &mut &[u8]) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

#[inline]
pub(crate) fn read_i32(buf: &mut &[u8]) -> Result<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

#[inline]
pub(crate) fn read_f32(buf: &mut &[u8]) -> Result<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32())
}

#[inline]
pub(crate) fn read_u64(buf: &mut &[u8]) -> Result<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

#[inline]
pub(crate) fn read_i64(buf: &mut &[u8]) -> Result<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64())
}

#[inline]
pub(crate) fn read_f64(buf: &mut &[u8]) -> Result<f64> {
    ensure(buf, 8)?;
    Ok(buf.get_f64())
}
