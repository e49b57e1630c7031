use thiserror::Error;

/// Errors that can occur while parsing a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The payload length specified by the frame header was not the
    /// value necessary for the specific frame type.
    #[error("invalid payload length")]
    InvalidPayloadLength,

    /// A window increment of zero, or with the reserved bit set.
    #[error("invalid window increment")]
    InvalidWindowUpdateValue,

    /// An invalid stream identifier was provided.
    ///
    /// This is returned if a GOAWAY frame is received with a stream
    /// identifier other than zero, or a stream frame with identifier zero.
    #[error("invalid stream id")]
    InvalidStreamId,

    /// The frame kind has no encoding; only decoded frames carry it.
    #[error("frame kind cannot be encoded")]
    Unencodable,
}
