//! Frame codec: turns the transport byte stream into typed frames and back.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::Error;
use crate::frame::{Frame, Head, HEADER_LEN};

/// Decodes and encodes frames with a 9-byte fixed header.
///
/// Decoding is two-phase: the header is consumed as soon as it is complete,
/// then the decoder waits for the full payload. A frame is only ever yielded
/// whole, so the byte stream stays aligned no matter what the session layer
/// does with it.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: u32,
    partial: Option<Partial>,
}

#[derive(Debug, Clone, Copy)]
struct Partial {
    head: Head,
    payload_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: u32) -> FrameCodec {
        FrameCodec {
            max_frame_size,
            partial: None,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        let partial = match self.partial {
            Some(partial) => partial,
            None => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let payload_len =
                    ((src[0] as usize) << 16) | ((src[1] as usize) << 8) | src[2] as usize;
                if payload_len > self.max_frame_size as usize {
                    return Err(Error::FrameSize(format!(
                        "frame of {payload_len} bytes exceeds maximum of {}",
                        self.max_frame_size
                    )));
                }

                let head = Head::parse(&src[3..HEADER_LEN]);
                src.advance(HEADER_LEN);

                let partial = Partial { head, payload_len };
                self.partial = Some(partial);
                partial
            }
        };

        if src.len() < partial.payload_len {
            src.reserve(partial.payload_len - src.len());
            return Ok(None);
        }
        self.partial = None;

        let payload = src.split_to(partial.payload_len).freeze();
        let frame = Frame::load(partial.head, payload)?;
        trace!(?frame, "decoded frame");
        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.partial.is_some() || !src.is_empty() => {
                // the transport died mid-frame
                Err(io::Error::from(io::ErrorKind::UnexpectedEof).into())
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Error> {
        trace!(?frame, "encoding frame");
        frame.encode(dst).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::frame::{Data, DEFAULT_MAX_FRAME_SIZE};

    fn encode(frame: Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        FrameCodec::new(DEFAULT_MAX_FRAME_SIZE)
            .encode(frame, &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_across_split_reads() {
        let wire = encode(Data::new(3.into(), Bytes::from_static(b"hello")).into());

        let mut codec = FrameCodec::new(DEFAULT_MAX_FRAME_SIZE);
        let mut src = BytesMut::new();

        // header only
        src.extend_from_slice(&wire[..HEADER_LEN]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        // partial payload
        src.extend_from_slice(&wire[HEADER_LEN..HEADER_LEN + 2]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&wire[HEADER_LEN + 2..]);
        let frame = codec.decode(&mut src).unwrap().unwrap();
        match frame {
            Frame::Data(data) => {
                assert_eq!(data.stream_id(), 3);
                assert_eq!(&data.payload()[..], b"hello");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_kinds_are_tolerated() {
        let mut src = BytesMut::new();
        // type 0x2 is not a kind this layer produces
        src.extend_from_slice(&[0, 0, 1, 0x2, 0, 0, 0, 0, 5, 0xff]);

        let mut codec = FrameCodec::new(DEFAULT_MAX_FRAME_SIZE);
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert!(matches!(frame, Frame::Unknown(_)));
        assert!(src.is_empty(), "payload fully consumed");
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let mut src = BytesMut::new();
        src.extend_from_slice(&[0xff, 0xff, 0xff, 0x0, 0, 0, 0, 0, 3]);

        let mut codec = FrameCodec::new(DEFAULT_MAX_FRAME_SIZE);
        assert!(matches!(
            codec.decode(&mut src),
            Err(Error::FrameSize(_))
        ));
    }
}
