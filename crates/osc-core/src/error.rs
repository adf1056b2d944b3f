//! Error types for the OSC core

use thiserror::Error;

/// Result type alias for OSC codec and dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// OSC core error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Value has no OSC type-tag mapping
    #[error("unsupported argument type: {0}")]
    UnsupportedType(String),

    /// Bad padding, missing terminator or truncated primitive
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Message structure is wrong (e.g. type-tag string without leading ',')
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// Argument payload does not match its type tag
    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    /// Bundle header or one of its elements failed to decode
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// Packet is empty or its length is not a multiple of 4
    #[error("invalid framing: packet length {0} is not a positive multiple of 4")]
    InvalidFraming(usize),

    /// First byte is neither '/' nor '#'
    #[error("unrecognized packet: first byte 0x{0:02x}")]
    UnrecognizedPacket(u8),

    /// Address pattern could not be compiled
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Length does not fit the 32-bit wire length field
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Bundles nested deeper than the decoder accepts
    #[error("bundle nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

impl Error {
    /// True for errors caused by bytes received from the network
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedData(_)
                | Error::MalformedPacket(_)
                | Error::MalformedArgument(_)
                | Error::MalformedBundle(_)
                | Error::InvalidFraming(_)
                | Error::UnrecognizedPacket(_)
                | Error::NestingTooDeep(_)
        )
    }
}
