use std::fmt;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// A reliable, ordered, full-duplex byte channel a session multiplexes over.
///
/// The address accessors are a capability probe: transports that know their
/// endpoints (TCP) override them, everything else inherits the `None`
/// defaults and the session reports synthetic addresses instead.
pub trait Transport: AsyncRead + AsyncWrite + Send + 'static {
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

impl Transport for TcpStream {
    fn local_addr(&self) -> Option<SocketAddr> {
        TcpStream::local_addr(self).ok()
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }
}

impl Transport for tokio::io::DuplexStream {}

/// A session endpoint address.
///
/// When the transport exposes socket addresses they are passed through;
/// otherwise the session substitutes a synthetic address whose network name
/// identifies the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAddr {
    Socket(SocketAddr),
    Local,
    Remote,
}

impl SessionAddr {
    /// The name of the network this address belongs to, in the spirit of
    /// socket address families.
    pub fn network(&self) -> &'static str {
        match self {
            SessionAddr::Socket(_) => "tcp",
            SessionAddr::Local | SessionAddr::Remote => "muxado",
        }
    }
}

impl fmt::Display for SessionAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAddr::Socket(addr) => addr.fmt(f),
            SessionAddr::Local => f.write_str("muxado: local"),
            SessionAddr::Remote => f.write_str("muxado: remote"),
        }
    }
}
