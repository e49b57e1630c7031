#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use muxado::frame::{Frame, DEFAULT_MAX_FRAME_SIZE};
use muxado::{FrameCodec, Session};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

const TRANSPORT_BUF: usize = 64 * 1024;

pub fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A connected client/server session pair over an in-memory transport.
pub fn session_pair() -> (Session, Session) {
    let (a, b) = tokio::io::duplex(TRANSPORT_BUF);
    (Session::client(a), Session::server(b))
}

/// A client session whose peer is driven frame by frame from the test.
pub fn client_with_raw_peer() -> (Session, RawPeer) {
    let (a, b) = tokio::io::duplex(TRANSPORT_BUF);
    (Session::client(a), RawPeer::new(b))
}

/// The remote end of a session, speaking raw frames.
pub struct RawPeer {
    reader: FramedRead<ReadHalf<DuplexStream>, FrameCodec>,
    writer: FramedWrite<WriteHalf<DuplexStream>, FrameCodec>,
}

impl RawPeer {
    pub fn new(io: DuplexStream) -> RawPeer {
        let (read_half, write_half) = tokio::io::split(io);
        RawPeer {
            reader: FramedRead::new(read_half, FrameCodec::new(DEFAULT_MAX_FRAME_SIZE)),
            writer: FramedWrite::new(write_half, FrameCodec::new(DEFAULT_MAX_FRAME_SIZE)),
        }
    }

    pub async fn send(&mut self, frame: impl Into<Frame>) {
        self.writer.send(frame.into()).await.expect("send frame");
    }

    pub async fn recv(&mut self) -> Frame {
        self.reader
            .next()
            .await
            .expect("peer hit eof")
            .expect("decode frame")
    }

    /// Receive the next frame that is not a WNDINC; window credits arrive at
    /// unpredictable points.
    pub async fn recv_not_wndinc(&mut self) -> Frame {
        loop {
            match self.recv().await {
                Frame::WndInc(_) => continue,
                frame => return frame,
            }
        }
    }
}
