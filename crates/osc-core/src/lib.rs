//! OSC Core
//!
//! Open Sound Control 1.0 packet codec and address-pattern dispatch.
//!
//! This crate provides:
//! - Argument and packet types ([`Argument`], [`Message`], [`Bundle`], [`Packet`])
//! - The binary wire codec ([`codec`], [`decode_packet`])
//! - Time tags ([`TimeTag`])
//! - Address-pattern compilation ([`Pattern`]) and dispatch ([`AddressSpace`])
//!
//! ```
//! use osc_core::{decode_packet, AddressSpace, Message};
//!
//! let space = AddressSpace::new();
//! space.handle("/synth/*/freq", |msg| println!("{}", msg)).unwrap();
//!
//! let bytes = Message::new("/synth/1/freq").with_argument(440.0f32).marshal().unwrap();
//! let packet = decode_packet(&bytes).unwrap();
//! assert_eq!(space.dispatch_packet(&packet), 1);
//! ```

pub mod address;
pub mod address_space;
pub mod bundle;
pub mod codec;
pub mod error;
pub mod message;
pub mod time;
pub mod types;

pub use address::Pattern;
pub use address_space::{AddressSpace, Method, MethodHandler};
pub use bundle::Bundle;
pub use codec::{decode_packet, encode_packet};
pub use error::{Error, Result};
pub use message::Message;
pub use time::TimeTag;
pub use types::{Argument, Packet};

/// Default UDP/TCP port used by the command-line tools
pub const DEFAULT_PORT: u16 = 8000;
