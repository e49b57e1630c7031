use std::io;
use std::sync::Arc;

use thiserror::Error as ThisError;

use crate::frame::{self, Reason};

/// Errors surfaced by sessions and streams.
///
/// The terminal sentinels (`SessionClosed`, `RemoteGoneAway`,
/// `StreamsExhausted`, `WriteTimeout`, `PeerClosed`) are what callers match
/// on; the carrier variants wrap the cause of a session-fatal failure.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// The session is shut down; all pending and future operations fail.
    #[error("session closed")]
    SessionClosed,

    /// The peer announced via GOAWAY that it accepts no new streams.
    #[error("remote has gone away")]
    RemoteGoneAway,

    /// The 31-bit local stream ID space is used up.
    #[error("stream ids exhausted")]
    StreamsExhausted,

    /// A synchronous frame write missed its deadline.
    #[error("frame write timed out")]
    WriteTimeout,

    /// The peer closed the session without an error of its own.
    #[error("session closed by remote peer")]
    PeerClosed,

    /// The peer violated the protocol; the session is torn down.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer sent a frame larger than the negotiated maximum.
    #[error("frame size error: {0}")]
    FrameSize(String),

    /// A local fault (panic, unencodable frame).
    #[error("internal error: {0}")]
    Internal(String),

    /// The stream was reset, locally or by the peer.
    #[error("stream reset: {0}")]
    StreamReset(Reason),

    /// The peer terminated the session via GOAWAY.
    #[error("remote terminated session: {reason}: {debug}")]
    Remote { reason: Reason, debug: String },

    /// Transport I/O failure.
    #[error("transport: {0}")]
    Io(Arc<io::Error>),
}

impl Error {
    /// The wire-level error code carried by RST and GOAWAY frames for this
    /// error.
    pub fn reason(&self) -> Reason {
        match self {
            Error::SessionClosed => Reason::SESSION_CLOSED,
            Error::RemoteGoneAway => Reason::REMOTE_GONE_AWAY,
            Error::StreamsExhausted => Reason::STREAMS_EXHAUSTED,
            Error::WriteTimeout => Reason::WRITE_TIMEOUT,
            Error::PeerClosed => Reason::PEER_EOF,
            Error::Protocol(_) => Reason::PROTOCOL_ERROR,
            Error::FrameSize(_) => Reason::FRAME_SIZE_ERROR,
            Error::Internal(_) | Error::Io(_) => Reason::INTERNAL_ERROR,
            Error::StreamReset(reason) => *reason,
            Error::Remote { reason, .. } => *reason,
        }
    }

    pub(crate) fn into_io(self) -> io::Error {
        let kind = match &self {
            Error::SessionClosed | Error::PeerClosed => io::ErrorKind::ConnectionAborted,
            Error::RemoteGoneAway | Error::StreamReset(_) | Error::Remote { .. } => {
                io::ErrorKind::ConnectionReset
            }
            Error::WriteTimeout => io::ErrorKind::TimedOut,
            Error::Io(e) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, self)
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Error {
        Error::Io(Arc::new(src))
    }
}

impl From<frame::Error> for Error {
    fn from(src: frame::Error) -> Error {
        match src {
            // a local fault, not peer misbehavior
            frame::Error::Unencodable => Error::Internal(src.to_string()),
            _ => Error::Protocol(src.to_string()),
        }
    }
}
