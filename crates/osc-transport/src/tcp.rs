//! TCP transport implementation
//!
//! OSC over a byte stream needs explicit packet boundaries: each packet is
//! preceded by its length as a 4-byte big-endian integer.

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use osc_core::{AddressSpace, Packet};
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::deliver_packet;
use crate::error::{Result, TransportError};
use crate::traits::{OscClient, OscServer};

/// Default maximum packet size (64KB)
pub const DEFAULT_MAX_PACKET_SIZE: usize = 65535;

/// Pause after a failed accept before trying again
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// TCP configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum packet size in bytes, excluding the length prefix
    pub max_packet_size: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// Read one length-prefixed packet
///
/// Returns `Ok(None)` when the stream ends cleanly before a new prefix.
pub async fn read_packet<R>(reader: &mut R, max_packet_size: usize) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > max_packet_size {
        return Err(TransportError::PacketTooLarge {
            size: len,
            max: max_packet_size,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(Bytes::from(buf)))
}

/// Write one packet with its length prefix
pub async fn write_packet<W>(writer: &mut W, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(data.len()).map_err(|_| TransportError::PacketTooLarge {
        size: data.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = BytesMut::with_capacity(4 + data.len());
    frame.put_u32(len);
    frame.extend_from_slice(data);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read packets from a connection until it closes, dispatching each one
async fn run_connection<R>(
    reader: R,
    peer: SocketAddr,
    address_space: Arc<AddressSpace>,
    max_packet_size: usize,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);

    loop {
        match read_packet(&mut reader, max_packet_size).await {
            Ok(Some(data)) => {
                debug!("TCP received {} bytes from {}", data.len(), peer);
                deliver_packet(&address_space, &data, peer);
            }
            Ok(None) => {
                debug!("TCP connection from {} closed", peer);
                break;
            }
            Err(e) => {
                warn!("Closing TCP connection from {}: {}", peer, e);
                break;
            }
        }
    }
}

/// TCP server dispatching received packets to an address space
pub struct TcpServer {
    listener: TcpListener,
    address_space: Arc<AddressSpace>,
    config: TcpConfig,
}

impl TcpServer {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, TcpConfig::default()).await
    }

    /// Bind with config
    pub async fn bind_with_config(addr: &str, config: TcpConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(format!("{}: {}", addr, e)))?;

        info!("OSC TCP server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            address_space: Arc::new(AddressSpace::new()),
            config,
        })
    }

    /// Share an existing address space instead of the server's own
    pub fn with_address_space(mut self, address_space: Arc<AddressSpace>) -> Self {
        self.address_space = address_space;
        self
    }

    pub fn config(&self) -> &TcpConfig {
        &self.config
    }
}

#[async_trait]
impl OscServer for TcpServer {
    fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(TransportError::Io)
    }

    fn address_space(&self) -> &Arc<AddressSpace> {
        &self.address_space
    }

    async fn serve(&self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("TCP accept error: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };

            info!("TCP connection from {}", peer);
            let _ = stream.set_nodelay(true);

            tokio::spawn(run_connection(
                stream,
                peer,
                self.address_space.clone(),
                self.config.max_packet_size,
            ));
        }
    }
}

/// TCP client
///
/// Packets sent back by the remote on the same connection are dispatched to
/// the client's own address space.
pub struct TcpClient {
    remote: SocketAddr,
    address_space: Arc<AddressSpace>,
    config: TcpConfig,
    writer: Option<AsyncMutex<OwnedWriteHalf>>,
    reader_task: Option<JoinHandle<()>>,
    connected: Arc<Mutex<bool>>,
}

impl TcpClient {
    pub fn new(remote: SocketAddr) -> Self {
        Self::with_config(remote, TcpConfig::default())
    }

    pub fn with_config(remote: SocketAddr, config: TcpConfig) -> Self {
        Self {
            remote,
            address_space: Arc::new(AddressSpace::new()),
            config,
            writer: None,
            reader_task: None,
            connected: Arc::new(Mutex::new(false)),
        }
    }

    /// Share an existing address space for responses
    pub fn with_address_space(mut self, address_space: Arc<AddressSpace>) -> Self {
        self.address_space = address_space;
        self
    }

    /// Address space that responses from the remote are dispatched to
    pub fn address_space(&self) -> &Arc<AddressSpace> {
        &self.address_space
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}

#[async_trait]
impl OscClient for TcpClient {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        // Drop a connection the remote already closed
        self.writer = None;
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }

        info!("Connecting to OSC TCP server {}", self.remote);
        let stream = TcpStream::connect(self.remote)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("{}: {}", self.remote, e)))?;
        let _ = stream.set_nodelay(true);

        let (reader, writer) = stream.into_split();
        let connected = Arc::new(Mutex::new(true));
        let connected_clone = connected.clone();
        let remote = self.remote;
        let address_space = self.address_space.clone();
        let max_size = self.config.max_packet_size;

        self.reader_task = Some(tokio::spawn(async move {
            run_connection(reader, remote, address_space, max_size).await;
            *connected_clone.lock() = false;
        }));
        self.writer = Some(AsyncMutex::new(writer));
        self.connected = connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            let mut writer = writer.into_inner();
            if let Err(e) = writer.shutdown().await {
                debug!("TCP shutdown error: {}", e);
            }
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        *self.connected.lock() = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some() && *self.connected.lock()
    }

    async fn send(&self, packet: &Packet) -> Result<()> {
        let writer = self.writer.as_ref().ok_or(TransportError::NotConnected)?;
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }
        let data = packet.marshal()?;

        if data.len() > self.config.max_packet_size {
            return Err(TransportError::PacketTooLarge {
                size: data.len(),
                max: self.config.max_packet_size,
            });
        }

        let mut writer = writer.lock().await;
        write_packet(&mut *writer, &data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        debug!("TCP sent {} bytes to {}", data.len(), self.remote);
        Ok(())
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
