use bytes::{BufMut, Bytes};

use crate::frame::{Error, Head, Kind, Reason, StreamId};

/*
GOAWAY Frame {
    Length (24),
    Type (8) = 0x07,

    Unused Flags (8),

    Reserved (1),
    Stream Identifier (31) = 0,

    Reserved (1),
    Last Stream Identifier (31),

    Error Code (32),

    Additional Debug Data (..),
}
*/

/// A GOAWAY frame: announces that no more new streams will be accepted from
/// this side, carrying the last handled stream ID and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAway {
    last_stream_id: StreamId,
    reason: Reason,
    debug: Bytes,
}

impl GoAway {
    pub fn new(last_stream_id: StreamId, reason: Reason, debug: Bytes) -> GoAway {
        GoAway {
            last_stream_id,
            reason,
            debug,
        }
    }

    pub fn load(head: Head, payload: &[u8]) -> Result<GoAway, Error> {
        if payload.len() < 8 {
            return Err(Error::InvalidPayloadLength);
        }
        if !head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        let (last_stream_id, _) = StreamId::parse(&payload[..4]);
        let reason = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let debug = Bytes::copy_from_slice(&payload[8..]);

        Ok(GoAway {
            last_stream_id,
            reason: reason.into(),
            debug,
        })
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::GoAway, 0, StreamId::ZERO)
    }

    pub fn last_stream_id(&self) -> StreamId {
        self.last_stream_id
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn debug(&self) -> &Bytes {
        &self.debug
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        self.head().encode(8 + self.debug.len(), dst);
        self.last_stream_id.encode(dst);
        dst.put_u32(self.reason.into());
        dst.put_slice(&self.debug);
    }
}
