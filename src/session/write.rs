use std::future::pending;
use std::sync::Arc;

use futures::SinkExt;
use tokio::io::{AsyncWrite, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::codec::FramedWrite;
use tracing::{debug, trace};

use crate::codec::FrameCodec;
use crate::error::Error;
use crate::frame::Frame;
use crate::session::SessionInner;

/// One outbound frame plus an optional completion callback.
pub(crate) struct WriteReq {
    pub frame: Frame,
    pub done: Option<oneshot::Sender<Result<(), Error>>>,
}

impl WriteReq {
    /// A request whose result nobody waits for.
    pub fn detached(frame: Frame) -> WriteReq {
        WriteReq { frame, done: None }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => pending().await,
    }
}

impl SessionInner {
    /// Queue a frame for the writer task, returning the completion handle.
    ///
    /// Split from [`await_completion`] so that callers who must not reorder
    /// against concurrent submissions (SYN emission) can enqueue while
    /// holding their lock and wait for the result after releasing it.
    pub(crate) async fn enqueue_frame(
        &self,
        frame: Frame,
        deadline: Option<Instant>,
    ) -> Result<oneshot::Receiver<Result<(), Error>>, Error> {
        let (done, rx) = oneshot::channel();
        tokio::select! {
            biased;
            _ = self.dead.cancelled() => Err(Error::SessionClosed),
            _ = expire(deadline) => Err(Error::WriteTimeout),
            permit = self.write_tx.reserve() => match permit {
                Ok(permit) => {
                    permit.send(WriteReq { frame, done: Some(done) });
                    Ok(rx)
                }
                Err(_) => Err(Error::SessionClosed),
            },
        }
    }

    /// Wait for the writer's verdict on a previously queued frame.
    pub(crate) async fn await_completion(
        &self,
        rx: oneshot::Receiver<Result<(), Error>>,
        deadline: Option<Instant>,
    ) -> Result<(), Error> {
        tokio::select! {
            biased;
            _ = self.dead.cancelled() => Err(Error::SessionClosed),
            _ = expire(deadline) => Err(Error::WriteTimeout),
            res = rx => res.unwrap_or(Err(Error::SessionClosed)),
        }
    }

    /// Write a frame through the writer task and wait for the result.
    pub(crate) async fn write_frame(
        &self,
        frame: Frame,
        deadline: Option<Instant>,
    ) -> Result<(), Error> {
        let rx = self.enqueue_frame(frame, deadline).await?;
        self.await_completion(rx, deadline).await
    }

    /// Fire-and-forget submission for protocol housekeeping frames (RST,
    /// WNDINC). The result is discarded; a failed write tears the session
    /// down through the writer task anyway.
    pub(crate) fn write_frame_detached(self: &Arc<Self>, frame: Frame) {
        if self.dead.is_cancelled() {
            return;
        }
        match self.write_tx.try_send(WriteReq::detached(frame)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(req)) => {
                let inner = self.clone();
                tokio::spawn(async move {
                    let _ = inner.write_frame(req.frame, None).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// The writer task: sole owner of the transport's write half.
///
/// Frames leave in queue order; each submitter learns its own frame's fate
/// through the completion callback. Any write error terminates the session.
pub(crate) async fn run_writer<T>(
    inner: Arc<SessionInner>,
    mut framed: FramedWrite<WriteHalf<T>, FrameCodec>,
    mut write_rx: mpsc::Receiver<WriteReq>,
) where
    T: AsyncWrite,
{
    loop {
        let req = tokio::select! {
            biased;
            _ = inner.dead.cancelled() => break,
            req = write_rx.recv() => match req {
                Some(req) => req,
                None => break,
            },
        };

        // a transport stalled by backpressure must not outlive shutdown
        let res = tokio::select! {
            res = framed.send(req.frame) => res,
            _ = inner.dead.cancelled() => break,
        };
        let err = res.clone().err();
        if let Some(done) = req.done {
            let _ = done.send(res);
        }
        if let Some(e) = err {
            debug!(%e, "frame write failed, terminating session");
            let _ = inner.die(Some(e)).await;
            break;
        }
    }

    // flush whatever made it to the sink and close the write half
    trace!("writer task exiting");
    let _ = framed.close().await;
}
