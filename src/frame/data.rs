use bytes::{BufMut, Bytes};

use crate::frame::{Error, Head, Kind, StreamId};

/*
DATA Frame {
    Length (24),
    Type (8) = 0x00,

    Unused Flags (6),
    SYN Flag (1),
    FIN Flag (1),

    Reserved (1),
    Stream Identifier (31),

    Data (..),
}
*/

const FIN: u8 = 0x1;
const SYN: u8 = 0x2;
const ALL: u8 = FIN | SYN;

/// A DATA frame: a chunk of stream bytes, optionally opening the stream (SYN)
/// or half-closing it (FIN).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    stream_id: StreamId,
    flags: DataFlags,
    payload: Bytes,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DataFlags(u8);

// ===== impl Data =====

impl Data {
    pub fn new(stream_id: StreamId, payload: Bytes) -> Data {
        Data {
            stream_id,
            flags: DataFlags::default(),
            payload,
        }
    }

    /// An empty DATA frame with the SYN flag, opening `stream_id`.
    pub fn syn(stream_id: StreamId) -> Data {
        Data {
            stream_id,
            flags: DataFlags(SYN),
            payload: Bytes::new(),
        }
    }

    /// An empty DATA frame with the FIN flag, half-closing `stream_id`.
    pub fn fin(stream_id: StreamId) -> Data {
        Data {
            stream_id,
            flags: DataFlags(FIN),
            payload: Bytes::new(),
        }
    }

    pub fn load(head: Head, payload: Bytes) -> Result<Data, Error> {
        if head.stream_id().is_zero() {
            return Err(Error::InvalidStreamId);
        }

        Ok(Data {
            stream_id: head.stream_id(),
            flags: DataFlags::load(head.flag()),
            payload,
        })
    }

    pub fn head(&self) -> Head {
        Head::new(Kind::Data, self.flags.0, self.stream_id)
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_syn(&self) -> bool {
        self.flags.is_syn()
    }

    pub fn is_fin(&self) -> bool {
        self.flags.is_fin()
    }

    pub fn set_syn(&mut self) {
        self.flags.0 |= SYN;
    }

    pub fn set_fin(&mut self) {
        self.flags.0 |= FIN;
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        self.head().encode(self.payload.len(), dst);
        dst.put_slice(&self.payload);
    }
}

// ===== impl DataFlags =====

impl DataFlags {
    fn load(byte: u8) -> DataFlags {
        DataFlags(byte & ALL)
    }

    fn is_syn(&self) -> bool {
        self.0 & SYN == SYN
    }

    fn is_fin(&self) -> bool {
        self.0 & FIN == FIN
    }
}
