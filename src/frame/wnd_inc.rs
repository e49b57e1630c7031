use bytes::BufMut;

use crate::frame::{Error, Head, Kind, StreamId};

/*
WNDINC Frame {
    Length (24) = 0x04,
    Type (8) = 0x08,

    Unused Flags (8),

    Reserved (1),
    Stream Identifier (31),

    Reserved (1),
    Window Increment (31),
}
*/

/// A WNDINC frame: credits the peer additional flow-control window on a
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WndInc {
    stream_id: StreamId,
    increment: u32,
}

impl WndInc {
    pub fn new(stream_id: StreamId, increment: u32) -> WndInc {
        WndInc {
            stream_id,
            increment,
        }
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<WndInc, Error> {
        if payload.len() != 4 {
            return Err(Error::InvalidPayloadLength);
        }
        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let increment =
            u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & !(1 << 31);
        if increment == 0 {
            return Err(Error::InvalidWindowUpdateValue);
        }

        Ok(WndInc {
            stream_id: head.stream_id(),
            increment,
        })
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::WndInc, 0, self.stream_id)
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        self.head().encode(4, dst);
        dst.put_u32(self.increment & !(1 << 31));
    }
}
