use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncRead, ReadHalf};
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::codec::FrameCodec;
use crate::error::Error;
use crate::frame::{Data, Frame, GoAway, Reason, Reset, StreamId};
use crate::session::{RemoteDiag, SessionInner};
use crate::stream::{Stream, StreamPrivate};

/// The reader task: pulls frames off the transport and dispatches them until
/// EOF, an error, or shutdown.
///
/// Dropping `accept_tx` on exit is what closes the accept queue, so blocked
/// acceptors observe the termination cause.
pub(crate) async fn run_reader<T>(
    inner: Arc<SessionInner>,
    mut framed: FramedRead<ReadHalf<T>, FrameCodec>,
    accept_tx: mpsc::Sender<Stream>,
) where
    T: AsyncRead,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = inner.dead.cancelled() => return,
            frame = framed.next() => frame,
        };
        match frame {
            // clean EOF is a graceful shutdown
            None => {
                let _ = inner.die(None).await;
                return;
            }
            Some(Err(e)) => {
                let _ = inner.die(Some(e)).await;
                return;
            }
            Some(Ok(frame)) => {
                // a dispatch error may leave the session in an illegal
                // state; stop consuming the transport immediately
                if let Err(e) = inner.handle_frame(frame, &accept_tx).await {
                    let _ = inner.die(Some(e)).await;
                    return;
                }
            }
        }
        if inner.dead.is_cancelled() {
            return;
        }
    }
}

impl SessionInner {
    async fn handle_frame(
        self: &Arc<Self>,
        frame: Frame,
        accept_tx: &mpsc::Sender<Stream>,
    ) -> Result<(), Error> {
        match frame {
            Frame::Data(data) => {
                if data.is_syn() {
                    // starting a new stream is a special case
                    return self.handle_syn(data, accept_tx).await;
                }

                match self.get_stream(data.stream_id())? {
                    Some(stream) => stream.recv_data(data),
                    None => {
                        // the payload is already consumed; the peer just
                        // doesn't know the stream is gone. Stream-level
                        // error, never fatal to the session.
                        trace!(id = %data.stream_id(), "DATA for a closed stream");
                        self.write_frame_detached(
                            Reset::new(data.stream_id(), Reason::STREAM_CLOSED).into(),
                        );
                        Ok(())
                    }
                }
            }

            Frame::Reset(reset) => {
                if let Some(stream) = self.get_stream(reset.stream_id())? {
                    stream.recv_reset(reset);
                }
                Ok(())
            }

            Frame::WndInc(wnd_inc) => {
                if let Some(stream) = self.get_stream(wnd_inc.stream_id())? {
                    stream.recv_wnd_inc(wnd_inc);
                }
                Ok(())
            }

            Frame::GoAway(go_away) => {
                self.handle_go_away(go_away);
                Ok(())
            }

            Frame::Unknown(head) => {
                trace!(?head, "ignoring unknown frame kind");
                Ok(())
            }
        }
    }

    async fn handle_syn(
        self: &Arc<Self>,
        frame: Data,
        accept_tx: &mpsc::Sender<Stream>,
    ) -> Result<(), Error> {
        let id = frame.stream_id();

        // refuse new streams once we've announced our own departure
        if self.local.gone_away() {
            self.write_frame_detached(Reset::new(id, Reason::STREAM_REFUSED).into());
            return Ok(());
        }

        let last_remote = self.remote.last_id();
        if id.is_zero() || id.as_u32() <= last_remote {
            proto_err!(session: "SYN for stream {} at or below last remote id {}", id, last_remote);
            return Err(Error::Protocol(format!(
                "initiated stream id {id} is not greater than last remote id {last_remote}"
            )));
        }
        if self.role.is_local_init(id) {
            proto_err!(session: "SYN for stream {} has local parity", id);
            return Err(Error::Protocol(format!(
                "initiated stream id {id} has wrong parity for the remote endpoint"
            )));
        }

        self.remote.set_last_id(id);

        // reserve the accept slot before materializing anything, so a
        // refused stream leaves no table entry behind
        let offer = self.config.accept_offer_timeout;
        match tokio::time::timeout(offer, accept_tx.reserve()).await {
            Ok(Ok(permit)) => {
                let (stream, core) = self.make_stream(id);
                self.streams.insert(id, core.clone());
                trace!(%id, "accepted remote stream");
                permit.send(stream);
                // SYN DATA may carry bytes and a FIN
                core.recv_data(frame)
            }
            // the acceptor is gone; treat its streams as refused
            Ok(Err(_)) => {
                self.write_frame_detached(Reset::new(id, Reason::STREAM_REFUSED).into());
                Ok(())
            }
            Err(_) => {
                debug!(%id, "accept queue full, refusing stream");
                self.write_frame_detached(Reset::new(id, Reason::ACCEPT_QUEUE_FULL).into());
                Ok(())
            }
        }
    }

    fn handle_go_away(&self, frame: GoAway) {
        debug!(reason = ?frame.reason(), "remote gone away");

        // publish the diagnostics before announcing the departure so
        // `wait` observers never see a torn pair
        {
            let mut diag = self.remote_diag.lock().unwrap();
            *diag = Some(RemoteDiag {
                error: Error::Remote {
                    reason: frame.reason(),
                    debug: String::from_utf8_lossy(frame.debug()).into_owned(),
                },
                debug: frame.debug().clone(),
            });
        }
        self.remote.set_gone_away();

        // streams the peer never observed can never be served
        let last = frame.last_stream_id();
        for stream in self.streams.snapshot() {
            let id = stream.id();
            if self.role.is_local_init(id) && id > last {
                stream.close_with(Error::RemoteGoneAway);
            }
        }
    }

    /// Look up the target of an inbound stream frame.
    ///
    /// An ID above the last one assigned for its parity was never legally
    /// created, which is a protocol violation. A missing entry at or below
    /// it just means the stream is already closed.
    fn get_stream(&self, id: StreamId) -> Result<Option<Arc<dyn StreamPrivate>>, Error> {
        let last = if self.role.is_local_init(id) {
            self.local.last_id()
        } else {
            self.remote.last_id()
        };
        if id.as_u32() > last {
            proto_err!(session: "frame for unassigned stream {}", id);
            return Err(Error::Protocol(format!(
                "{id} is an invalid, unassigned stream id"
            )));
        }
        Ok(self.streams.get(id))
    }
}
