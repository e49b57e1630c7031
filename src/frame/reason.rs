use std::fmt;

/// A protocol error code, carried by RST and GOAWAY frames.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Reason(u32);

impl Reason {
    pub const NO_ERROR: Reason = Reason(0);
    pub const PROTOCOL_ERROR: Reason = Reason(1);
    pub const INTERNAL_ERROR: Reason = Reason(2);
    pub const FLOW_CONTROL_ERROR: Reason = Reason(3);
    pub const STREAM_CLOSED: Reason = Reason(4);
    pub const STREAM_REFUSED: Reason = Reason(5);
    pub const STREAM_RESET: Reason = Reason(6);
    pub const FRAME_SIZE_ERROR: Reason = Reason(7);
    pub const ACCEPT_QUEUE_FULL: Reason = Reason(8);
    pub const REMOTE_GONE_AWAY: Reason = Reason(9);
    pub const STREAMS_EXHAUSTED: Reason = Reason(10);
    pub const WRITE_TIMEOUT: Reason = Reason(11);
    pub const SESSION_CLOSED: Reason = Reason(12);
    pub const PEER_EOF: Reason = Reason(13);

    /// Get a string description of the error code.
    pub fn description(&self) -> &str {
        match self.0 {
            0 => "no error",
            1 => "protocol error",
            2 => "internal error",
            3 => "flow control error",
            4 => "stream closed",
            5 => "stream refused",
            6 => "stream reset",
            7 => "frame size error",
            8 => "accept queue full",
            9 => "remote gone away",
            10 => "streams exhausted",
            11 => "write timeout",
            12 => "session closed",
            13 => "peer eof",
            _ => "unknown error code",
        }
    }
}

impl From<u32> for Reason {
    fn from(src: u32) -> Reason {
        Reason(src)
    }
}

impl From<Reason> for u32 {
    fn from(src: Reason) -> u32 {
        src.0
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.0 {
            0 => "NO_ERROR",
            1 => "PROTOCOL_ERROR",
            2 => "INTERNAL_ERROR",
            3 => "FLOW_CONTROL_ERROR",
            4 => "STREAM_CLOSED",
            5 => "STREAM_REFUSED",
            6 => "STREAM_RESET",
            7 => "FRAME_SIZE_ERROR",
            8 => "ACCEPT_QUEUE_FULL",
            9 => "REMOTE_GONE_AWAY",
            10 => "STREAMS_EXHAUSTED",
            11 => "WRITE_TIMEOUT",
            12 => "SESSION_CLOSED",
            13 => "PEER_EOF",
            other => return write!(fmt, "Reason({other})"),
        };
        fmt.write_str(name)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.description())
    }
}
