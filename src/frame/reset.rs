use bytes::BufMut;

use crate::frame::{Error, Head, Kind, Reason, StreamId};

/*
RST Frame {
    Length (24) = 0x04,
    Type (8) = 0x03,

    Unused Flags (8),

    Reserved (1),
    Stream Identifier (31),

    Error Code (32),
}
*/

/// An RST frame: abortive termination of a single stream, with a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reset {
    stream_id: StreamId,
    reason: Reason,
}

impl Reset {
    pub fn new(stream_id: StreamId, reason: Reason) -> Reset {
        Reset { stream_id, reason }
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<Reset, Error> {
        if payload.len() != 4 {
            return Err(Error::InvalidPayloadLength);
        }
        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let reason = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);

        Ok(Reset {
            stream_id: head.stream_id(),
            reason: reason.into(),
        })
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::Reset, 0, self.stream_id)
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        self.head().encode(4, dst);
        dst.put_u32(self.reason.into());
    }
}
