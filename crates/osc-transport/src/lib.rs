//! OSC Transport Layer
//!
//! Thin socket shims around the OSC core:
//! - UDP: one packet per datagram
//! - TCP: each packet prefixed with its 4-byte big-endian length
//!
//! Servers hand every received buffer to [`deliver_packet`], which decodes it
//! and dispatches messages to an [`AddressSpace`]. Malformed packets are
//! logged and dropped; bundles are decoded but not dispatched.

pub mod error;
pub mod tcp;
pub mod traits;
pub mod udp;

use osc_core::{decode_packet, AddressSpace, Packet};
use std::net::SocketAddr;
use tracing::{debug, warn};

pub use error::{Result, TransportError};
pub use tcp::{TcpClient, TcpConfig, TcpServer};
pub use traits::{OscClient, OscServer};
pub use udp::{UdpClient, UdpConfig, UdpServer};

/// Decode one received packet and dispatch it
///
/// Returns the number of handlers invoked.
pub fn deliver_packet(space: &AddressSpace, data: &[u8], from: SocketAddr) -> usize {
    match decode_packet(data) {
        Ok(Packet::Message(message)) => {
            let invoked = space.dispatch(&message);
            if invoked == 0 {
                debug!("No method matches {} (from {})", message.address, from);
            }
            invoked
        }
        Ok(Packet::Bundle(bundle)) => {
            warn!(
                "Dropping bundle with {} element(s) from {}: bundles are not dispatched",
                bundle.elements.len(),
                from
            );
            0
        }
        Err(e) if e.is_decode_error() => {
            warn!("Dropping malformed packet from {} ({} bytes): {}", from, data.len(), e);
            0
        }
        Err(e) => {
            warn!("Failed to handle packet from {}: {}", from, e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_core::{Bundle, Message};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9000))
    }

    #[test]
    fn test_deliver_message() {
        let space = AddressSpace::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        space
            .handle("/a/*", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let data = Message::new("/a/b").marshal().unwrap();
        assert_eq!(deliver_packet(&space, &data, peer()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deliver_drops_malformed_and_bundles() {
        let space = AddressSpace::new();
        space.handle("/*", |_| panic!("should not run")).unwrap();

        assert_eq!(deliver_packet(&space, b"/a\0", peer()), 0);
        assert_eq!(deliver_packet(&space, b"?abc", peer()), 0);

        let bundle = Bundle::new().with_packet(Message::new("/a"));
        assert_eq!(deliver_packet(&space, &bundle.marshal().unwrap(), peer()), 0);
    }
}
