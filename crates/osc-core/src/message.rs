//! OSC messages
//!
//! Wire layout:
//! ```text
//! string(address) ++ string("," ++ type tags) ++ argument payloads
//! ```

use crate::codec::{decode_string, encode_string};
use crate::types::{decode_arguments, encode_argument, tag};
use crate::{Argument, Result};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An OSC message: an address plus ordered arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub address: String,
    pub arguments: Vec<Argument>,
}

impl Default for Message {
    /// The empty message at `/`
    fn default() -> Self {
        Self::new("/")
    }
}

impl Message {
    /// Create a message with no arguments
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            arguments: Vec::new(),
        }
    }

    /// Builder form of [`Message::add_argument`]
    pub fn with_argument(mut self, arg: impl Into<Argument>) -> Self {
        self.add_argument(arg);
        self
    }

    /// Append an argument
    pub fn add_argument(&mut self, arg: impl Into<Argument>) {
        self.arguments.push(arg.into());
    }

    /// `","` followed by one tag character per argument
    pub fn type_tag_string(&self) -> String {
        let mut tags = String::with_capacity(self.arguments.len() + 1);
        tags.push(tag::PREFIX);
        tags.extend(self.arguments.iter().map(Argument::type_tag));
        tags
    }

    /// Address split on `/`; the leading empty part is kept
    pub fn address_parts(&self) -> Vec<&str> {
        self.address.split('/').collect()
    }

    /// Encode to wire bytes
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.estimate_size());
        self.marshal_into(&mut buf)?;
        Ok(buf.freeze())
    }

    pub(crate) fn marshal_into(&self, buf: &mut BytesMut) -> Result<()> {
        encode_string(buf, &self.address)?;
        encode_string(buf, &self.type_tag_string())?;
        for arg in &self.arguments {
            encode_argument(buf, arg)?;
        }
        Ok(())
    }

    /// Decode from wire bytes
    pub fn unmarshal(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let address = decode_string(&mut buf)?;
        let type_tags = decode_string(&mut buf)?;
        let arguments = decode_arguments(&type_tags, &mut buf)?;

        Ok(Self { address, arguments })
    }

    /// Pre-allocation hint (avoids realloc for scalar-only messages)
    #[inline]
    fn estimate_size(&self) -> usize {
        self.address.len() + 4 + self.arguments.len() + 4 + self.arguments.len() * 8
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message{{Address: {}, Arguments: [", self.address)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, "]}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_default_message() {
        let msg = Message::default();
        assert_eq!(msg.address, "/");
        assert!(msg.arguments.is_empty());
    }

    #[test]
    fn test_type_tag_string() {
        assert_eq!(Message::default().type_tag_string(), ",");

        let msg = Message::new("/a")
            .with_argument(1i32)
            .with_argument(2.0f32)
            .with_argument("x")
            .with_argument(false);
        assert_eq!(msg.type_tag_string(), ",ifsF");
    }

    #[test]
    fn test_address_parts() {
        let msg = Message::new("/oscillator/4/frequency");
        assert_eq!(msg.address_parts(), vec!["", "oscillator", "4", "frequency"]);
    }

    #[test]
    fn test_empty_message_bytes() {
        let bytes = Message::default().marshal().unwrap();
        assert_eq!(&bytes[..], &[0x2F, 0, 0, 0, 0x2C, 0, 0, 0]);
    }

    #[test]
    fn test_unmarshal_requires_type_tags() {
        assert!(matches!(
            Message::unmarshal(b"/foo\0\0\0\0"),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn test_marshal_rejects_embedded_nul() {
        let msg = Message::new("/a").with_argument("ab\0cd");
        assert!(matches!(msg.marshal(), Err(Error::MalformedData(_))));

        let msg = Message::new("/a\0b");
        assert!(matches!(msg.marshal(), Err(Error::MalformedData(_))));
    }

    #[test]
    fn test_display() {
        let msg = Message::new("/a").with_argument(1i32).with_argument("b");
        assert_eq!(msg.to_string(), "Message{Address: /a, Arguments: [1 \"b\"]}");
    }
}
