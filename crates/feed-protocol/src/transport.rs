//! UDP socket ownership for the push feed.
//!
//! One socket carries both channels: control acks arrive from the
//! control port, data records from everywhere else. The transport only
//! moves bytes; classification and decoding live in [`crate::client`].

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::info;

use crate::config::FeedConfig;
use crate::error::Result;

/// Largest datagram the feed can emit.
pub const MAX_DATAGRAM: usize = 65536;

pub struct UdpTransport {
    socket: UdpSocket,
    control_addr: SocketAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind the fixed local port and resolve the control endpoint.
    /// Bind failure is unrecoverable for this transport instance.
    pub async fn bind(config: &FeedConfig) -> Result<Self> {
        let control_addr = (config.control_host.as_str(), config.control_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("cannot resolve control host {}", config.control_host),
                )
            })?;

        let socket = UdpSocket::bind(("0.0.0.0", config.local_port)).await?;
        info!("feed consumer listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            control_addr,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    /// Transmit a control datagram to the fixed control endpoint. Send
    /// failures surface to the caller; retry policy is theirs.
    pub async fn send_control(&self, payload: &[u8]) -> Result<()> {
        self.socket.send_to(payload, self.control_addr).await?;
        Ok(())
    }

    /// One bounded receive. `Ok(None)` means the timeout expired with no
    /// data, so the caller's poll loop can check for cancellation
    /// between attempts without blocking indefinitely.
    pub async fn recv(&mut self, timeout: Duration) -> Result<Option<(u16, &[u8])>> {
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut self.buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok((len, from))) => Ok(Some((from.port(), &self.buf[..len]))),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn control_port(&self) -> u16 {
        self.control_addr.port()
    }
}
