use std::future::Future;
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::{debug, trace};
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{error::Elapsed, timeout};

use crate::error::QueryError;
use crate::packet::PacketType;
use crate::query::ServerAddress;

/// One connected UDP socket to one server.
///
/// Every exchange is a single request datagram followed by a single response
/// datagram. [Transport::round_trip] takes `&mut self`, so there is never more
/// than one request in flight on the socket.
#[derive(Debug)]
pub struct Transport {
    sock: UdpSocket,
    timeout: Option<Duration>,
    buffer_size: usize,
}

impl Transport {
    /// Resolve `address`, bind an ephemeral local port and connect to it.
    ///
    /// `timeout_dur` bounds name resolution and each later send and receive;
    /// `None` waits forever. Datagrams larger than `buffer_size` are truncated.
    pub async fn connect(
        address: &ServerAddress,
        timeout_dur: Option<Duration>,
        buffer_size: usize,
    ) -> Result<Self, QueryError> {
        let target = address.to_string();
        let peer: SocketAddr = within(timeout_dur, lookup_host(target.as_str()))
            .await?
            .map_err(QueryError::UnreachableHost)?
            .next()
            .ok_or_else(|| QueryError::NoAddress(target.clone()))?;

        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let sock = UdpSocket::bind(local)
            .await
            .map_err(QueryError::FailedPortBind)?;
        sock.connect(peer)
            .await
            .map_err(QueryError::UnreachableHost)?;

        debug!("[{}] Connected from {:?}", peer, sock.local_addr().ok());

        Ok(Transport {
            sock,
            timeout: timeout_dur,
            buffer_size,
        })
    }

    /// Send `request` and wait for the next datagram from the server.
    ///
    /// An ICMP port-unreachable reported on the connected socket is not an
    /// answer; the call keeps waiting and ends in [QueryError::Timeout].
    pub async fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>, QueryError> {
        within(self.timeout, send(&self.sock, request))
            .await?
            .map_err(QueryError::SendError)?;
        debug!(
            "Sent {} bytes ({:?})",
            request.len(),
            PacketType::of(request)
        );

        let mut buf = vec![0u8; self.buffer_size];
        let len = within(self.timeout, recv(&self.sock, &mut buf))
            .await?
            .map_err(QueryError::ReceiveError)?;
        buf.truncate(len);
        debug!("Received {} bytes ({:?})", len, PacketType::of(&buf));

        Ok(buf)
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.sock.peer_addr()
    }
}

/// Send once, skipping a refusal left pending by an earlier exchange.
async fn send(sock: &UdpSocket, request: &[u8]) -> io::Result<usize> {
    loop {
        match sock.send(request).await {
            Err(err) if err.kind() == ErrorKind::ConnectionRefused => {
                trace!("Discarding pending refusal before send");
            }
            result => return result,
        }
    }
}

/// Wait for a datagram, treating refusals as "no reply yet".
async fn recv(sock: &UdpSocket, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match sock.recv(buf).await {
            Err(err) if err.kind() == ErrorKind::ConnectionRefused => {
                trace!("Peer refused the datagram, still waiting");
            }
            result => return result,
        }
    }
}

async fn within<F: Future>(timeout_dur: Option<Duration>, fut: F) -> Result<F::Output, Elapsed> {
    match timeout_dur {
        Some(dur) => timeout(dur, fut).await,
        None => Ok(fut.await),
    }
}
