//! Transport abstraction over the physical links a device can sit behind.
//!
//! The protocol engine only needs a way to push encoded frame bytes out and
//! pull raw byte runs in; framing is recovered by
//! [`FrameDecoder`][crate::protocol::FrameDecoder] regardless of whether
//! the link preserves message boundaries (UDP, USB) or not (TCP, BLE).
//!
//! ## Discovery
//!
//! Network devices advertise `_remo._udp` over mDNS and answer on UDP port
//! 9920; the registry can also probe a configured white list of addresses.
use crate::{Error, Result};
use async_trait::async_trait;
use remocam_protocol::TransportKind;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::{ToSocketAddrs, UdpSocket};

/// UDP port network devices listen on.
pub const UDP_CONTROL_PORT: u16 = 9920;

/// A bidirectional byte link to one device.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one encoded frame.
    async fn send(&self, frame: &[u8]) -> Result;

    /// Receives the next raw byte run. May return partial frames, multiple
    /// frames, or garbage; errors mean the link is gone.
    async fn recv(&self) -> Result<Vec<u8>>;

    fn kind(&self) -> TransportKind;
}

/// [Transport] over a connected UDP socket.
pub struct UdpTransport {
    sock: UdpSocket,
}

impl UdpTransport {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let sock = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).await?;
        sock.connect(addr).await?;
        Ok(Self { sock })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, frame: &[u8]) -> Result {
        self.sock.send(frame).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>> {
        // Max frame plus slack; a datagram never carries more than one.
        let mut b = [0u8; 2048];
        let l = self.sock.recv(&mut b).await?;
        Ok(b[..l].to_vec())
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }
}
