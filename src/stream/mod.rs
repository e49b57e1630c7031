//! The user-facing stream object and the narrow contract the session uses to
//! drive it.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll, Waker};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::sync::PollSender;
use tracing::trace;

use crate::error::Error;
use crate::frame::{Data, Reason, Reset, StreamId, WndInc};
use crate::session::{SessionInner, WriteReq};

mod flow;

use flow::FlowControl;

/// The operations a session requires from every stream it tracks.
///
/// The session never reaches deeper into a stream than this: delivery of
/// DATA, RST and WNDINC frames, a terminal close, and the stream's ID.
pub(crate) trait StreamPrivate: Send + Sync {
    fn id(&self) -> StreamId;

    /// Deliver a DATA frame. An error terminates the session.
    fn recv_data(&self, frame: Data) -> Result<(), Error>;

    fn recv_reset(&self, frame: Reset);

    fn recv_wnd_inc(&self, frame: WndInc);

    /// Terminal close driven by the session: shutdown or remote GOAWAY.
    fn close_with(&self, err: Error);
}

/// One multiplexed byte stream.
///
/// Reads pull from the stream's inbound buffer, crediting the peer's
/// flow-control window as bytes are consumed. Writes are chunked to the
/// available send window and handed to the session's writer task.
/// `poll_shutdown` half-closes the write side with a FIN; dropping a stream
/// that was not fully closed resets it.
pub struct Stream {
    core: Arc<StreamCore>,
    /// Poll-context handle on the session's write pipeline.
    write_tx: PollSender<WriteReq>,
}

pub(crate) struct StreamCore {
    id: StreamId,
    session: Weak<SessionInner>,
    max_chunk: usize,
    recv: Mutex<RecvHalf>,
    send: Mutex<SendHalf>,
}

struct RecvHalf {
    buf: BytesMut,
    flow: FlowControl,
    fin: bool,
    err: Option<Error>,
    waker: Option<Waker>,
}

struct SendHalf {
    flow: FlowControl,
    fin_sent: bool,
    err: Option<Error>,
    waker: Option<Waker>,
}

// ===== impl Stream =====

impl Stream {
    pub(crate) fn new(
        session: &Arc<SessionInner>,
        id: StreamId,
        window_size: u32,
        max_chunk: usize,
    ) -> (Stream, Arc<StreamCore>) {
        let core = Arc::new(StreamCore {
            id,
            session: Arc::downgrade(session),
            max_chunk,
            recv: Mutex::new(RecvHalf {
                buf: BytesMut::new(),
                flow: FlowControl::new(window_size),
                fin: false,
                err: None,
                waker: None,
            }),
            send: Mutex::new(SendHalf {
                flow: FlowControl::new(window_size),
                fin_sent: false,
                err: None,
                waker: None,
            }),
        });
        let stream = Stream {
            core: core.clone(),
            write_tx: PollSender::new(session.write_sender()),
        };
        (stream, core)
    }

    pub fn id(&self) -> StreamId {
        self.core.id
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let mut recv = this.core.recv.lock().unwrap();

        if let Some(err) = recv.err.clone() {
            return Poll::Ready(Err(err.into_io()));
        }

        if !recv.buf.is_empty() {
            let n = recv.buf.len().min(buf.remaining());
            buf.put_slice(&recv.buf.split_to(n));

            // return the consumed bytes to the peer's window; after FIN the
            // peer cannot send anyway
            if !recv.fin {
                let _ = recv.flow.credit(n as u32);
                drop(recv);
                this.core.send_credit(n as u32);
            }
            return Poll::Ready(Ok(()));
        }

        if recv.fin {
            // EOF
            return Poll::Ready(Ok(()));
        }

        recv.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        {
            let mut send = this.core.send.lock().unwrap();
            if let Some(err) = send.err.clone() {
                return Poll::Ready(Err(err.into_io()));
            }
            if send.fin_sent {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "stream write half is closed",
                )));
            }
            if data.is_empty() {
                return Poll::Ready(Ok(0));
            }
            if send.flow.available() == 0 {
                send.waker = Some(cx.waker().clone());
                return Poll::Pending;
            }
        }

        // take a pipeline slot only once window is available, so a
        // flow-blocked stream never holds one
        match this.write_tx.poll_reserve(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Err(_)) => return Poll::Ready(Err(Error::SessionClosed.into_io())),
            Poll::Ready(Ok(())) => {}
        }

        let mut send = this.core.send.lock().unwrap();
        if let Some(err) = send.err.clone() {
            this.write_tx.abort_send();
            return Poll::Ready(Err(err.into_io()));
        }

        // the window only grows between the checks above and here: no one
        // else debits this stream
        let n = data
            .len()
            .min(send.flow.available() as usize)
            .min(this.core.max_chunk);
        if send.flow.debit(n as u32).is_err() {
            return Poll::Ready(Err(Error::Internal(
                "send window accounting underflow".to_owned(),
            )
            .into_io()));
        }
        drop(send);

        let frame = Data::new(this.core.id, Bytes::copy_from_slice(&data[..n]));
        if this
            .write_tx
            .send_item(WriteReq::detached(frame.into()))
            .is_err()
        {
            return Poll::Ready(Err(Error::SessionClosed.into_io()));
        }
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // frames are handed to the writer task as they are produced; there
        // is no local buffering to flush
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        {
            let send = this.core.send.lock().unwrap();
            if send.fin_sent {
                return Poll::Ready(Ok(()));
            }
            if let Some(err) = send.err.clone() {
                return Poll::Ready(Err(err.into_io()));
            }
        }

        match this.write_tx.poll_reserve(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Err(_)) => return Poll::Ready(Err(Error::SessionClosed.into_io())),
            Poll::Ready(Ok(())) => {}
        }

        let mut send = this.core.send.lock().unwrap();
        if let Some(err) = send.err.clone() {
            this.write_tx.abort_send();
            return Poll::Ready(Err(err.into_io()));
        }
        send.fin_sent = true;
        drop(send);

        trace!(id = %this.core.id, "half-closing stream");
        let _ = this
            .write_tx
            .send_item(WriteReq::detached(Data::fin(this.core.id).into()));
        this.core.maybe_finished();
        Poll::Ready(Ok(()))
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        let clean = {
            let recv = self.core.recv.lock().unwrap();
            let send = self.core.send.lock().unwrap();
            (recv.fin || recv.err.is_some()) && (send.fin_sent || send.err.is_some())
        };
        if clean {
            self.core.remove_from_session();
        } else {
            trace!(id = %self.core.id, "stream dropped before close, resetting");
            self.core.reset_with(Reason::STREAM_CLOSED);
        }
    }
}

// ===== impl StreamCore =====

impl StreamCore {
    /// Abort the stream for a stream-scoped violation: RST the peer and
    /// close locally. The session stays up.
    fn reset_with(&self, reason: Reason) {
        if let Some(session) = self.session.upgrade() {
            session.write_frame_detached(Reset::new(self.id, reason).into());
        }
        self.close_with(Error::StreamReset(reason));
    }

    /// Credit the peer's view of our receive window.
    fn send_credit(&self, n: u32) {
        if let Some(session) = self.session.upgrade() {
            session.write_frame_detached(WndInc::new(self.id, n).into());
        }
    }

    /// Drop the table entry once both directions are terminal.
    fn maybe_finished(&self) {
        let recv_done = {
            let recv = self.recv.lock().unwrap();
            recv.fin || recv.err.is_some()
        };
        let send_done = {
            let send = self.send.lock().unwrap();
            send.fin_sent || send.err.is_some()
        };
        if recv_done && send_done {
            self.remove_from_session();
        }
    }

    fn remove_from_session(&self) {
        if let Some(session) = self.session.upgrade() {
            session.remove_stream(self.id);
        }
    }
}

impl StreamPrivate for StreamCore {
    fn id(&self) -> StreamId {
        self.id
    }

    fn recv_data(&self, frame: Data) -> Result<(), Error> {
        let mut recv = self.recv.lock().unwrap();
        if recv.err.is_some() {
            return Ok(());
        }
        if recv.fin {
            drop(recv);
            proto_err!(stream: "DATA on half-closed stream {}", self.id);
            self.reset_with(Reason::PROTOCOL_ERROR);
            return Ok(());
        }

        let fin = frame.is_fin();
        let payload = frame.into_payload();
        if recv.flow.debit(payload.len() as u32).is_err() {
            drop(recv);
            proto_err!(stream: "receive window of stream {} exceeded", self.id);
            self.reset_with(Reason::FLOW_CONTROL_ERROR);
            return Ok(());
        }

        recv.buf.extend_from_slice(&payload);
        recv.fin = fin;
        if let Some(waker) = recv.waker.take() {
            waker.wake();
        }
        drop(recv);

        if fin {
            self.maybe_finished();
        }
        Ok(())
    }

    fn recv_reset(&self, frame: Reset) {
        trace!(id = %self.id, reason = ?frame.reason(), "peer reset stream");
        self.close_with(Error::StreamReset(frame.reason()));
    }

    fn recv_wnd_inc(&self, frame: WndInc) {
        let mut send = self.send.lock().unwrap();
        if send.err.is_some() {
            return;
        }
        if send.flow.credit(frame.increment()).is_err() {
            drop(send);
            proto_err!(stream: "send window of stream {} overflowed", self.id);
            self.reset_with(Reason::FLOW_CONTROL_ERROR);
            return;
        }
        if let Some(waker) = send.waker.take() {
            waker.wake();
        }
    }

    fn close_with(&self, err: Error) {
        trace!(id = %self.id, %err, "closing stream");
        {
            let mut recv = self.recv.lock().unwrap();
            if recv.err.is_none() {
                recv.err = Some(err.clone());
            }
            if let Some(waker) = recv.waker.take() {
                waker.wake();
            }
        }
        {
            let mut send = self.send.lock().unwrap();
            if send.err.is_none() {
                send.err = Some(err);
            }
            if let Some(waker) = send.waker.take() {
                waker.wake();
            }
        }
        self.remove_from_session();
    }
}
