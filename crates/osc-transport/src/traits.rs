//! Transport trait definitions

use async_trait::async_trait;
use osc_core::{AddressSpace, Message, Packet};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::Result;

/// A client that sends OSC packets to one remote host
#[async_trait]
pub trait OscClient: Send + Sync {
    /// Open the underlying socket or connection
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection; a no-op when not connected
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Encode and send a message or bundle
    async fn send(&self, packet: &Packet) -> Result<()>;
}

/// A server that decodes received packets and dispatches messages
#[async_trait]
pub trait OscServer: Send + Sync {
    /// Get the local address
    fn local_addr(&self) -> Result<SocketAddr>;

    /// The address space incoming messages are dispatched to
    fn address_space(&self) -> &Arc<AddressSpace>;

    /// Register a handler on this server's address space
    fn handle<F>(&self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&Message) + Send + Sync + 'static,
        Self: Sized,
    {
        self.address_space().handle(pattern, handler)?;
        Ok(())
    }

    /// Receive and dispatch until the socket fails
    async fn serve(&self) -> Result<()>;
}
