use bytes::BufMut;

use crate::frame::StreamId;

/*
Frame Header {
    Length (24),
    Type (8),

    Flags (8),

    Reserved (1),
    Stream Identifier (31),
}
*/

/// The number of bytes in a frame header.
pub const HEADER_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    kind: Kind,
    flag: u8,
    stream_id: StreamId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Data = 0,
    Reset = 3,
    GoAway = 7,
    WndInc = 8,
    Unknown,
}

// ===== impl Head =====

impl Head {
    pub fn new(kind: Kind, flag: u8, stream_id: StreamId) -> Head {
        Head {
            kind,
            flag,
            stream_id,
        }
    }

    /// Parse the 6 bytes following the length field.
    pub fn parse(header: &[u8]) -> Head {
        let (stream_id, _) = StreamId::parse(&header[2..6]);

        Head {
            kind: Kind::new(header[0]),
            flag: header[1],
            stream_id,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn flag(&self) -> u8 {
        self.flag
    }

    pub fn encode<B: BufMut>(&self, payload_len: usize, dst: &mut B) {
        debug_assert!(self.kind != Kind::Unknown);

        dst.put_uint(payload_len as u64, 3);
        dst.put_u8(self.kind as u8);
        dst.put_u8(self.flag);
        self.stream_id.encode(dst);
    }
}

// ===== impl Kind =====

impl Kind {
    pub fn new(byte: u8) -> Kind {
        match byte {
            0 => Kind::Data,
            3 => Kind::Reset,
            7 => Kind::GoAway,
            8 => Kind::WndInc,
            _ => Kind::Unknown,
        }
    }
}
