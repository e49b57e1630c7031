//! Stream multiplexing over a single reliable transport.
//!
//! A [`Session`] carries many independent, bidirectional, flow-controlled
//! byte streams over one ordered, full-duplex byte channel (a TCP connection,
//! a TLS session, an in-memory duplex). Either side can [`open`] streams;
//! the other side [`accept`]s them. Streams implement `AsyncRead` and
//! `AsyncWrite` and are independent of each other: a stalled stream never
//! blocks its siblings beyond what the shared transport imposes.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! let tcp = tokio::net::TcpStream::connect("127.0.0.1:4444").await?;
//! let session = muxado::Session::client(tcp);
//!
//! let mut stream = session.open().await?;
//! stream.write_all(b"hello").await?;
//! stream.shutdown().await?;
//!
//! let mut reply = Vec::new();
//! stream.read_to_end(&mut reply).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`open`]: Session::open
//! [`accept`]: Session::accept

macro_rules! proto_err {
    (session: $($msg:tt)+) => {
        tracing::debug!("session error PROTOCOL_ERROR -- {};", format_args!($($msg)+))
    };
    (stream: $($msg:tt)+) => {
        tracing::debug!("stream error -- {};", format_args!($($msg)+))
    };
}

mod builder;
mod codec;
mod error;
pub mod frame;
mod role;
mod session;
mod stream;
mod transport;

pub use builder::SessionBuilder;
pub use codec::FrameCodec;
pub use error::Error;
pub use frame::{Reason, StreamId};
pub use session::{Session, SessionConfig};
pub use stream::Stream;
pub use transport::{SessionAddr, Transport};
