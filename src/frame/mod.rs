//! Typed frames and their wire representation.
//!
//! Every frame starts with a 9-byte header: a 24-bit payload length, an 8-bit
//! type, an 8-bit flags field, and a 31-bit stream identifier (high bit
//! reserved). The session layer consumes DATA, RST, WNDINC and GOAWAY;
//! anything else decodes as [`Frame::Unknown`] and is ignored.

use bytes::{BufMut, Bytes};

mod data;
mod error;
mod go_away;
mod head;
mod reason;
mod reset;
mod stream_id;
mod wnd_inc;

pub use data::Data;
pub use error::Error;
pub use go_away::GoAway;
pub use head::{Head, Kind, HEADER_LEN};
pub use reason::Reason;
pub use reset::Reset;
pub use stream_id::StreamId;
pub use wnd_inc::WndInc;

/// The default maximum accepted frame payload.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// The default initial flow-control window of every stream.
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 0x10000;

/// The largest legal flow-control window.
pub const MAX_WINDOW_SIZE: u32 = (1 << 31) - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Data),
    Reset(Reset),
    WndInc(WndInc),
    GoAway(GoAway),
    Unknown(Head),
}

impl Frame {
    /// Parse a frame from its header and complete payload.
    pub fn load(head: Head, payload: Bytes) -> Result<Frame, Error> {
        let frame = match head.kind() {
            Kind::Data => Frame::Data(Data::load(head, payload)?),
            Kind::Reset => Frame::Reset(Reset::load(head, &payload)?),
            Kind::WndInc => Frame::WndInc(WndInc::load(head, &payload)?),
            Kind::GoAway => Frame::GoAway(GoAway::load(head, &payload)?),
            Kind::Unknown => Frame::Unknown(head),
        };
        Ok(frame)
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) -> Result<(), Error> {
        match self {
            Frame::Data(f) => f.encode(dst),
            Frame::Reset(f) => f.encode(dst),
            Frame::WndInc(f) => f.encode(dst),
            Frame::GoAway(f) => f.encode(dst),
            // never produced locally
            Frame::Unknown(_) => return Err(Error::Unencodable),
        }
        Ok(())
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Frame {
        Frame::Data(src)
    }
}

impl From<Reset> for Frame {
    fn from(src: Reset) -> Frame {
        Frame::Reset(src)
    }
}

impl From<WndInc> for Frame {
    fn from(src: WndInc) -> Frame {
        Frame::WndInc(src)
    }
}

impl From<GoAway> for Frame {
    fn from(src: GoAway) -> Frame {
        Frame::GoAway(src)
    }
}
