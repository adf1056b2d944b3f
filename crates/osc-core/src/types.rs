//! OSC argument and packet types

use crate::codec::{self, read_f32, read_f64, read_i32, read_i64};
use crate::time::{decode_time_tag, encode_time_tag};
use crate::{Bundle, Error, Message, Result, TimeTag};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag characters
pub mod tag {
    pub const NIL: char = 'N';
    pub const INT32: char = 'i';
    pub const FLOAT32: char = 'f';
    pub const STRING: char = 's';
    pub const BLOB: char = 'b';
    pub const TRUE: char = 'T';
    pub const FALSE: char = 'F';
    pub const INT64: char = 'h';
    pub const FLOAT64: char = 'd';
    pub const TIME_TAG: char = 't';

    /// Leading character of every type-tag string
    pub const PREFIX: char = ',';
}

// ============================================================================
// Arguments
// ============================================================================

/// A single OSC message argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Nil,
    Int32(i32),
    Float32(f32),
    String(String),
    Blob(Bytes),
    /// Encoded as `T` or `F` with no payload bytes
    Bool(bool),
    Int64(i64),
    Float64(f64),
    TimeTag(TimeTag),
}

impl Argument {
    /// The one-character type tag for this argument
    pub fn type_tag(&self) -> char {
        match self {
            Argument::Nil => tag::NIL,
            Argument::Int32(_) => tag::INT32,
            Argument::Float32(_) => tag::FLOAT32,
            Argument::String(_) => tag::STRING,
            Argument::Blob(_) => tag::BLOB,
            Argument::Bool(true) => tag::TRUE,
            Argument::Bool(false) => tag::FALSE,
            Argument::Int64(_) => tag::INT64,
            Argument::Float64(_) => tag::FLOAT64,
            Argument::TimeTag(_) => tag::TIME_TAG,
        }
    }

    /// Build an argument from a type tag and its textual value
    ///
    /// `N`, `T` and `F` ignore `text`. Blobs take the UTF-8 bytes of `text`,
    /// time tags take the raw 64-bit value.
    pub fn parse(type_tag: char, text: &str) -> Result<Self> {
        let invalid = |e: &dyn fmt::Display| {
            Error::MalformedArgument(format!(
                "invalid value {:?} for type tag '{}': {}",
                text, type_tag, e
            ))
        };

        let arg = match type_tag {
            tag::NIL => Argument::Nil,
            tag::TRUE => Argument::Bool(true),
            tag::FALSE => Argument::Bool(false),
            tag::INT32 => Argument::Int32(text.parse().map_err(|e| invalid(&e))?),
            tag::FLOAT32 => Argument::Float32(text.parse().map_err(|e| invalid(&e))?),
            tag::STRING => Argument::String(text.to_string()),
            tag::BLOB => Argument::Blob(Bytes::copy_from_slice(text.as_bytes())),
            tag::INT64 => Argument::Int64(text.parse().map_err(|e| invalid(&e))?),
            tag::FLOAT64 => Argument::Float64(text.parse().map_err(|e| invalid(&e))?),
            tag::TIME_TAG => {
                Argument::TimeTag(TimeTag::from_raw(text.parse().map_err(|e| invalid(&e))?))
            }
            other => return Err(Error::UnsupportedType(format!("type tag '{}'", other))),
        };
        Ok(arg)
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Argument::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Argument::Float32(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parses `<tag>` or `<tag>:<value>`, e.g. `i:42`, `s:hello`, `T`
impl FromStr for Argument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let type_tag = chars
            .next()
            .ok_or_else(|| Error::MalformedArgument("empty argument".to_string()))?;
        let rest = chars.as_str();

        match rest.strip_prefix(':') {
            Some(text) => Argument::parse(type_tag, text),
            None if rest.is_empty() => Argument::parse(type_tag, ""),
            None => Err(Error::MalformedArgument(format!(
                "expected <tag>:<value>, got {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Nil => write!(f, "nil"),
            Argument::Int32(i) => write!(f, "{}", i),
            Argument::Float32(v) => write!(f, "{}", v),
            Argument::String(s) => write!(f, "{:?}", s),
            Argument::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Argument::Bool(b) => write!(f, "{}", b),
            Argument::Int64(i) => write!(f, "{}", i),
            Argument::Float64(v) => write!(f, "{}", v),
            Argument::TimeTag(tt) => write!(f, "{}", tt),
        }
    }
}

impl From<()> for Argument {
    fn from(_: ()) -> Self {
        Argument::Nil
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Argument::Int32(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Argument::Float32(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Argument::String(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Argument::String(v)
    }
}

impl From<Bytes> for Argument {
    fn from(v: Bytes) -> Self {
        Argument::Blob(v)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(v: Vec<u8>) -> Self {
        Argument::Blob(Bytes::from(v))
    }
}

impl From<&[u8]> for Argument {
    fn from(v: &[u8]) -> Self {
        Argument::Blob(Bytes::copy_from_slice(v))
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Argument::Bool(v)
    }
}

impl From<i64> for Argument {
    fn from(v: i64) -> Self {
        Argument::Int64(v)
    }
}

impl From<f64> for Argument {
    fn from(v: f64) -> Self {
        Argument::Float64(v)
    }
}

impl From<TimeTag> for Argument {
    fn from(v: TimeTag) -> Self {
        Argument::TimeTag(v)
    }
}

// ============================================================================
// Argument codec
// ============================================================================

/// Write the payload of one argument (nothing for `N`, `T` and `F`)
pub fn encode_argument(buf: &mut BytesMut, arg: &Argument) -> Result<()> {
    match arg {
        Argument::Nil | Argument::Bool(_) => {}
        Argument::Int32(i) => buf.put_i32(*i),
        Argument::Float32(f) => buf.put_f32(*f),
        Argument::String(s) => codec::encode_string(buf, s)?,
        Argument::Blob(b) => codec::encode_blob(buf, b)?,
        Argument::Int64(i) => buf.put_i64(*i),
        Argument::Float64(f) => buf.put_f64(*f),
        Argument::TimeTag(tt) => encode_time_tag(buf, tt),
    }
    Ok(())
}

/// Decode the arguments described by a type-tag string
///
/// Any failure aborts the whole list; partial argument lists are never
/// returned.
pub fn decode_arguments(type_tags: &str, buf: &mut &[u8]) -> Result<Vec<Argument>> {
    let tags = type_tags.strip_prefix(tag::PREFIX).ok_or_else(|| {
        Error::MalformedPacket(format!(
            "type tag string {:?} does not start with ','",
            type_tags
        ))
    })?;

    let mut args = Vec::with_capacity(tags.len());
    for (index, type_tag) in tags.chars().enumerate() {
        let arg = decode_argument(type_tag, buf).map_err(|e| {
            Error::MalformedArgument(format!("argument {} ('{}'): {}", index, type_tag, e))
        })?;
        args.push(arg);
    }
    Ok(args)
}

fn decode_argument(type_tag: char, buf: &mut &[u8]) -> Result<Argument> {
    let arg = match type_tag {
        tag::NIL => Argument::Nil,
        tag::TRUE => Argument::Bool(true),
        tag::FALSE => Argument::Bool(false),
        tag::INT32 => Argument::Int32(read_i32(buf)?),
        tag::FLOAT32 => Argument::Float32(read_f32(buf)?),
        tag::STRING => Argument::String(codec::decode_string(buf)?),
        tag::BLOB => Argument::Blob(codec::decode_blob(buf)?),
        tag::INT64 => Argument::Int64(read_i64(buf)?),
        tag::FLOAT64 => Argument::Float64(read_f64(buf)?),
        tag::TIME_TAG => Argument::TimeTag(decode_time_tag(buf)?),
        other => return Err(Error::UnsupportedType(format!("type tag '{}'", other))),
    };
    Ok(arg)
}

// ============================================================================
// Packets
// ============================================================================

/// An OSC packet: a message or a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl Packet {
    /// Encode to wire bytes
    pub fn marshal(&self) -> Result<Bytes> {
        match self {
            Packet::Message(m) => m.marshal(),
            Packet::Bundle(b) => b.marshal(),
        }
    }

    pub(crate) fn marshal_into(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Packet::Message(m) => m.marshal_into(buf),
            Packet::Bundle(b) => b.marshal_into(buf),
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Packet::Message(m) => Some(m),
            Packet::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&Bundle> {
        match self {
            Packet::Bundle(b) => Some(b),
            Packet::Message(_) => None,
        }
    }
}

impl From<Message> for Packet {
    fn from(m: Message) -> Self {
        Packet::Message(m)
    }
}

impl From<Bundle> for Packet {
    fn from(b: Bundle) -> Self {
        Packet::Bundle(b)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Message(m) => fmt::Display::fmt(m, f),
            Packet::Bundle(b) => fmt::Display::fmt(b, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        let cases = [
            (Argument::Nil, 'N'),
            (Argument::from(1i32), 'i'),
            (Argument::from(1.0f32), 'f'),
            (Argument::from("s"), 's'),
            (Argument::from(vec![1u8]), 'b'),
            (Argument::from(true), 'T'),
            (Argument::from(false), 'F'),
            (Argument::from(1i64), 'h'),
            (Argument::from(1.0f64), 'd'),
            (Argument::from(TimeTag::immediate()), 't'),
        ];
        for (arg, expected) in cases {
            assert_eq!(arg.type_tag(), expected, "{:?}", arg);
        }
    }

    #[test]
    fn test_nil_and_bool_have_no_payload() {
        for arg in [Argument::Nil, Argument::Bool(true), Argument::Bool(false)] {
            let mut buf = BytesMut::new();
            encode_argument(&mut buf, &arg).unwrap();
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_false_decodes_to_false() {
        let mut buf: &[u8] = &[];
        let args = decode_arguments(",TFN", &mut buf).unwrap();
        assert_eq!(
            args,
            vec![Argument::Bool(true), Argument::Bool(false), Argument::Nil]
        );
        assert_eq!(args[0].as_bool(), Some(true));
        assert_eq!(args[1].as_bool(), Some(false));
        assert_eq!(args[2].as_bool(), None);
    }

    #[test]
    fn test_missing_comma() {
        let mut buf: &[u8] = &[];
        assert!(matches!(
            decode_arguments("i", &mut buf),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_unknown_tag_aborts() {
        let data = [0u8, 0, 0, 1];
        let mut buf = &data[..];
        assert!(matches!(
            decode_arguments(",ix", &mut buf),
            Err(Error::MalformedArgument(_))
        ));
    }

    #[test]
    fn test_short_read_aborts() {
        let data = [0u8, 0];
        let mut buf = &data[..];
        assert!(matches!(
            decode_arguments(",i", &mut buf),
            Err(Error::MalformedArgument(_))
        ));
    }

    #[test]
    fn test_parse() {
        assert_eq!("i:42".parse::<Argument>().unwrap(), Argument::Int32(42));
        assert_eq!("f:0.5".parse::<Argument>().unwrap(), Argument::Float32(0.5));
        assert_eq!(
            "s:a:b".parse::<Argument>().unwrap(),
            Argument::String("a:b".to_string())
        );
        assert_eq!("T".parse::<Argument>().unwrap(), Argument::Bool(true));
        assert_eq!("N".parse::<Argument>().unwrap(), Argument::Nil);
        assert_eq!(
            "t:1".parse::<Argument>().unwrap(),
            Argument::TimeTag(TimeTag::immediate())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "q:1".parse::<Argument>(),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            "i:abc".parse::<Argument>(),
            Err(Error::MalformedArgument(_))
        ));
        assert!(matches!(
            "i42".parse::<Argument>(),
            Err(Error::MalformedArgument(_))
        ));
        assert!("".parse::<Argument>().is_err());
    }
}
