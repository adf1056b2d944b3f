//! UDP transport implementation
//!
//! One OSC packet per datagram. The server spawns a task per received
//! datagram, so handlers for different datagrams may run concurrently.

use async_trait::async_trait;
use bytes::Bytes;
use osc_core::{AddressSpace, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

use crate::deliver_packet;
use crate::error::{Result, TransportError};
use crate::traits::{OscClient, OscServer};

/// Largest payload that fits in a single IPv4 UDP datagram
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// UDP configuration
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Maximum packet size, for both receive buffers and outgoing packets
    pub max_packet_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// UDP server dispatching received packets to an address space
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    address_space: Arc<AddressSpace>,
    config: UdpConfig,
}

impl UdpServer {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, UdpConfig::default()).await
    }

    /// Bind with config
    pub async fn bind_with_config(addr: &str, config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(format!("{}: {}", addr, e)))?;

        info!("OSC UDP server bound to {}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
            address_space: Arc::new(AddressSpace::new()),
            config,
        })
    }

    /// Share an existing address space instead of the server's own
    pub fn with_address_space(mut self, address_space: Arc<AddressSpace>) -> Self {
        self.address_space = address_space;
        self
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }
}

#[async_trait]
impl OscServer for UdpServer {
    fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    fn address_space(&self) -> &Arc<AddressSpace> {
        &self.address_space
    }

    async fn serve(&self) -> Result<()> {
        let mut buf = vec![0u8; self.config.max_packet_size.min(MAX_DATAGRAM_SIZE)];

        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!("UDP receive error: {}", e);
                    return Err(TransportError::Io(e));
                }
            };

            debug!("UDP received {} bytes from {}", len, from);
            let data = Bytes::copy_from_slice(&buf[..len]);
            let space = self.address_space.clone();

            tokio::spawn(async move {
                deliver_packet(&space, &data, from);
            });
        }
    }
}

/// UDP client sending to a single remote address
pub struct UdpClient {
    remote: SocketAddr,
    local: SocketAddr,
    socket: Option<UdpSocket>,
    config: UdpConfig,
}

impl UdpClient {
    pub fn new(remote: SocketAddr) -> Self {
        Self::with_config(remote, UdpConfig::default())
    }

    pub fn with_config(remote: SocketAddr, config: UdpConfig) -> Self {
        let local = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        Self {
            remote,
            local,
            socket: None,
            config,
        }
    }

    /// Set the local address to send from; takes effect on the next connect
    pub fn set_local_addr(&mut self, local: SocketAddr) {
        self.local = local;
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Bound local address, once connected
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

#[async_trait]
impl OscClient for UdpClient {
    async fn connect(&mut self) -> Result<()> {
        let socket = UdpSocket::bind(self.local)
            .await
            .map_err(|e| TransportError::BindFailed(format!("{}: {}", self.local, e)))?;
        socket
            .connect(self.remote)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("{}: {}", self.remote, e)))?;

        debug!("UDP client {} -> {}", socket.local_addr()?, self.remote);
        self.socket = Some(socket);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.socket = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&self, packet: &Packet) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotConnected)?;
        let data = packet.marshal()?;

        if data.len() > self.config.max_packet_size {
            return Err(TransportError::PacketTooLarge {
                size: data.len(),
                max: self.config.max_packet_size,
            });
        }

        socket
            .send(&data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        debug!("UDP sent {} bytes to {}", data.len(), self.remote);
        Ok(())
    }
}
