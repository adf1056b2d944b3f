//! OSC bundles
//!
//! Wire layout:
//! ```text
//! "#bundle\0" ++ time tag (8 bytes) ++ { u32 size ++ size bytes of packet }*
//! ```

use crate::codec::{self, decode_string, read_u32, MAX_BUNDLE_DEPTH};
use crate::time::{decode_time_tag, encode_time_tag};
use crate::{Error, Packet, Result, TimeTag};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoded bundle identifier
pub const BUNDLE_IDENTIFIER: &[u8; 8] = b"#bundle\0";

const BUNDLE_TAG: &str = "#bundle";

/// A time-tagged, ordered collection of packets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub time_tag: TimeTag,
    pub elements: Vec<Packet>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Bundle {
    /// An empty bundle with an immediate time tag
    pub fn new() -> Self {
        Self::with_time_tag(TimeTag::immediate())
    }

    /// An empty bundle scheduled at `time_tag`
    pub fn with_time_tag(time_tag: TimeTag) -> Self {
        Self {
            time_tag,
            elements: Vec::new(),
        }
    }

    /// Append a child message or bundle
    pub fn add_packet(&mut self, packet: impl Into<Packet>) {
        self.elements.push(packet.into());
    }

    /// Builder form of [`Bundle::add_packet`]
    pub fn with_packet(mut self, packet: impl Into<Packet>) -> Self {
        self.add_packet(packet);
        self
    }

    /// Encode to wire bytes
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(16 + self.elements.len() * 32);
        self.marshal_into(&mut buf)?;
        Ok(buf.freeze())
    }

    pub(crate) fn marshal_into(&self, buf: &mut BytesMut) -> Result<()> {
        buf.extend_from_slice(BUNDLE_IDENTIFIER);
        encode_time_tag(buf, &self.time_tag);

        for element in &self.elements {
            // Reserve the size slot, encode in place, then backfill
            let size_at = buf.len();
            buf.put_u32(0);
            element.marshal_into(buf)?;

            let size = buf.len() - size_at - 4;
            if size > u32::MAX as usize {
                return Err(Error::PayloadTooLarge(size));
            }
            buf[size_at..size_at + 4].copy_from_slice(&(size as u32).to_be_bytes());
        }
        Ok(())
    }

    /// Decode from wire bytes
    pub fn unmarshal(bytes: &[u8]) -> Result<Self> {
        Self::unmarshal_at_depth(bytes, 0)
    }

    pub(crate) fn unmarshal_at_depth(bytes: &[u8], depth: usize) -> Result<Self> {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(Error::NestingTooDeep(MAX_BUNDLE_DEPTH));
        }

        let mut buf = bytes;
        let identifier = decode_string(&mut buf)
            .map_err(|e| Error::MalformedBundle(format!("bad identifier: {}", e)))?;
        if identifier != BUNDLE_TAG {
            return Err(Error::MalformedBundle(format!(
                "identifier is {:?}, expected \"#bundle\"",
                identifier
            )));
        }

        let time_tag = decode_time_tag(&mut buf)
            .map_err(|e| Error::MalformedBundle(format!("bad time tag: {}", e)))?;

        let mut elements = Vec::new();
        // Running out of data at a size slot is the normal end of the bundle
        while !buf.is_empty() {
            let index = elements.len();
            let size = read_u32(&mut buf).map_err(|e| {
                Error::MalformedBundle(format!("element {} size: {}", index, e))
            })? as usize;

            if buf.len() < size {
                return Err(Error::MalformedBundle(format!(
                    "element {} declares {} bytes, {} available",
                    index,
                    size,
                    buf.len()
                )));
            }
            let (data, rest) = buf.split_at(size);
            buf = rest;

            let packet = codec::decode_packet_at_depth(data, depth + 1).map_err(|e| match e {
                Error::NestingTooDeep(_) => e,
                other => Error::MalformedBundle(format!("element {}: {}", index, other)),
            })?;
            elements.push(packet);
        }

        Ok(Self { time_tag, elements })
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bundle: {{")?;
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        write!(f, "}}")
    }
}
