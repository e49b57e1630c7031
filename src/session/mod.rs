//! The session core: stream-ID allocation, frame demultiplexing, per-stream
//! lifecycle coordination, and at-most-once shutdown.
//!
//! A session owns two long-lived tasks. The reader pulls frames off the
//! transport and dispatches them; the writer is the sole owner of the write
//! half and drains a bounded queue of submissions. Everything else (`open`,
//! `accept`, per-stream I/O) happens on caller tasks and talks to those two
//! through channels.

mod config;
mod dispatch;
mod map;
mod write;

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::FrameCodec;
use crate::error::Error;
use crate::frame::{Data, GoAway, Reason, StreamId};
use crate::role::Role;
use crate::stream::{Stream, StreamCore};
use crate::transport::{SessionAddr, Transport};

pub use config::SessionConfig;

pub(crate) use map::StreamMap;
pub(crate) use write::WriteReq;

/// A multiplexing session over a single transport.
///
/// Methods take `&self`; wrap the session in an [`Arc`] to drive `open` and
/// `accept` from different tasks.
pub struct Session {
    inner: Arc<SessionInner>,
    accept_rx: Mutex<mpsc::Receiver<Stream>>,
}

/// State shared between the public handle, the reader, the writer, and every
/// live stream.
pub(crate) struct SessionInner {
    config: SessionConfig,
    role: Role,
    local: Half,
    remote: Half,
    streams: StreamMap,
    write_tx: mpsc::Sender<WriteReq>,

    /// Serializes ID allocation with SYN submission so SYNs hit the wire in
    /// increasing ID order.
    new_stream_lock: Mutex<()>,

    /// Closed exactly once, when the session terminates.
    dead: CancellationToken,
    die_once: AtomicBool,
    /// The first local error that terminated the session. Written before
    /// `dead` is cancelled.
    die_err: StdMutex<Option<Error>>,
    /// Diagnostics from a received GOAWAY. Written before `remote.gone_away`
    /// is set.
    remote_diag: StdMutex<Option<RemoteDiag>>,

    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

#[derive(Clone)]
pub(crate) struct RemoteDiag {
    pub error: Error,
    pub debug: Bytes,
}

/// One side's view of shutdown progress plus the last stream ID it used.
pub(crate) struct Half {
    gone_away: AtomicBool,
    last_id: AtomicU32,
}

impl Half {
    fn new(seed: u32) -> Half {
        Half {
            gone_away: AtomicBool::new(false),
            last_id: AtomicU32::new(seed),
        }
    }

    pub fn gone_away(&self) -> bool {
        self.gone_away.load(Ordering::SeqCst)
    }

    pub fn set_gone_away(&self) {
        self.gone_away.store(true, Ordering::SeqCst);
    }

    pub fn last_id(&self) -> u32 {
        self.last_id.load(Ordering::SeqCst)
    }

    pub fn set_last_id(&self, id: StreamId) {
        self.last_id.store(id.into(), Ordering::SeqCst);
    }

    fn bump_last_id(&self) -> u32 {
        self.last_id.fetch_add(2, Ordering::SeqCst) + 2
    }
}

// ===== impl Session =====

impl Session {
    /// A client session: it initiates odd-numbered streams.
    pub fn client<T: Transport>(io: T) -> Session {
        Session::with_config(io, Role::Client, SessionConfig::default())
    }

    /// A server session: it initiates even-numbered streams.
    pub fn server<T: Transport>(io: T) -> Session {
        Session::with_config(io, Role::Server, SessionConfig::default())
    }

    pub(crate) fn with_config<T: Transport>(io: T, role: Role, config: SessionConfig) -> Session {
        let local_addr = io.local_addr();
        let peer_addr = io.peer_addr();

        let (read_half, write_half) = tokio::io::split(io);
        let codec = FrameCodec::new(config.max_frame_size);
        let framed_read = FramedRead::new(read_half, codec.clone());
        let framed_write = FramedWrite::new(write_half, codec);

        let (write_tx, write_rx) = mpsc::channel(config.write_queue_depth);
        let (accept_tx, accept_rx) = mpsc::channel(config.accept_queue_depth);

        let inner = Arc::new(SessionInner {
            local: Half::new(role.local_seed()),
            remote: Half::new(role.remote_seed()),
            role,
            streams: StreamMap::default(),
            write_tx,
            new_stream_lock: Mutex::new(()),
            dead: CancellationToken::new(),
            die_once: AtomicBool::new(false),
            die_err: StdMutex::new(None),
            remote_diag: StdMutex::new(None),
            local_addr,
            peer_addr,
            config,
        });

        spawn_contained(
            "reader",
            inner.clone(),
            dispatch::run_reader(inner.clone(), framed_read, accept_tx),
        );
        spawn_contained(
            "writer",
            inner.clone(),
            write::run_writer(inner.clone(), framed_write, write_rx),
        );

        Session {
            inner,
            accept_rx: Mutex::new(accept_rx),
        }
    }

    /// Open a new stream to the peer.
    ///
    /// Fails with [`Error::RemoteGoneAway`] once the peer has sent GOAWAY and
    /// with [`Error::StreamsExhausted`] when the 31-bit ID space runs out.
    pub async fn open(&self) -> Result<Stream, Error> {
        let inner = &self.inner;
        if inner.remote.gone_away() {
            return Err(Error::RemoteGoneAway);
        }

        // holding the lock across the enqueue (but not the completion)
        // keeps SYNs on the wire in increasing ID order without losing
        // concurrency between openers
        let guard = inner.new_stream_lock.lock().await;

        let next_id = inner.local.bump_last_id();
        if next_id & (1 << 31) != 0 {
            return Err(Error::StreamsExhausted);
        }
        let id = StreamId::from(next_id);

        let (stream, core) = inner.make_stream(id);
        inner.streams.insert(id, core);

        trace!(%id, "opening stream");
        let queued = inner.enqueue_frame(Data::syn(id).into(), None).await;
        drop(guard);

        inner.await_completion(queued?, None).await?;
        Ok(stream)
    }

    /// Accept the next stream opened by the peer.
    ///
    /// Blocks until a stream arrives or the session ends; then returns the
    /// termination cause.
    pub async fn accept(&self) -> Result<Stream, Error> {
        let mut accept_rx = self.accept_rx.lock().await;
        match accept_rx.recv().await {
            Some(stream) => Ok(stream),
            None => {
                let err = self.inner.die_err.lock().unwrap().clone();
                Err(err.unwrap_or(Error::PeerClosed))
            }
        }
    }

    /// Gracefully shut the session down.
    ///
    /// The first call wins and returns `Ok`; every later call returns
    /// [`Error::SessionClosed`].
    pub async fn close(&self) -> Result<(), Error> {
        self.inner.die(None).await
    }

    /// Tell the peer no new streams will be accepted, without closing the
    /// session. Existing streams run to completion.
    pub async fn go_away(
        &self,
        reason: Reason,
        debug: Bytes,
        deadline: Option<Instant>,
    ) -> Result<(), Error> {
        self.inner.go_away(reason, debug, deadline).await
    }

    /// Block until the session is dead; returns the local termination error
    /// (if any), the peer's GOAWAY error (if any), and the peer's debug
    /// payload.
    pub async fn wait(&self) -> (Option<Error>, Option<Error>, Bytes) {
        self.inner.dead.cancelled().await;
        let local = self.inner.die_err.lock().unwrap().clone();
        let diag = self.inner.remote_diag.lock().unwrap().clone();
        match diag {
            Some(diag) => (local, Some(diag.error), diag.debug),
            None => (local, None, Bytes::new()),
        }
    }

    pub fn local_addr(&self) -> SessionAddr {
        match self.inner.local_addr {
            Some(addr) => SessionAddr::Socket(addr),
            None => SessionAddr::Local,
        }
    }

    pub fn peer_addr(&self) -> SessionAddr {
        match self.inner.peer_addr {
            Some(addr) => SessionAddr::Socket(addr),
            None => SessionAddr::Remote,
        }
    }

    pub fn addr(&self) -> SessionAddr {
        self.local_addr()
    }
}

// ===== impl SessionInner =====

impl SessionInner {
    /// Close the session with the given cause. At most one call proceeds;
    /// the rest observe [`Error::SessionClosed`].
    pub(crate) async fn die(self: &Arc<Self>, err: Option<Error>) -> Result<(), Error> {
        if self.die_once.swap(true, Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }

        let (reason, debug) = match &err {
            None => (Reason::NO_ERROR, Bytes::from_static(b"no error")),
            Some(e) => (e.reason(), Bytes::from(e.to_string())),
        };
        debug!(?reason, "session shutting down");

        // best effort; the peer may already be gone
        let deadline = Instant::now() + self.config.goaway_send_timeout;
        let _ = self.go_away(reason, debug, Some(deadline)).await;

        // the cause must be readable by the time anyone wakes on `dead`
        *self.die_err.lock().unwrap() = err;
        self.dead.cancel();

        // the reader and writer observe `dead`, drop their transport halves
        // and close the write side on the way out; here we only have to tell
        // the streams
        for stream in self.streams.snapshot() {
            stream.close_with(Error::SessionClosed);
        }
        Ok(())
    }

    /// Announce local departure: no new streams accepted from the peer.
    pub(crate) async fn go_away(
        &self,
        reason: Reason,
        debug: Bytes,
        deadline: Option<Instant>,
    ) -> Result<(), Error> {
        self.local.set_gone_away();
        let last_remote = StreamId::from(self.remote.last_id());
        self.write_frame(GoAway::new(last_remote, reason, debug).into(), deadline)
            .await
    }

    pub(crate) fn make_stream(self: &Arc<Self>, id: StreamId) -> (Stream, Arc<StreamCore>) {
        Stream::new(
            self,
            id,
            self.config.initial_window_size,
            self.config.max_frame_size as usize,
        )
    }

    /// Forget a stream. Does not error if it is already gone.
    pub(crate) fn remove_stream(&self, id: StreamId) {
        self.streams.remove(id);
    }

    pub(crate) fn write_sender(&self) -> mpsc::Sender<WriteReq> {
        self.write_tx.clone()
    }
}

/// Run a session task, translating a panic into an internal-error shutdown
/// so a single malformed frame cannot orphan the session.
fn spawn_contained<F>(task: &'static str, inner: Arc<SessionInner>, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let msg = panic_message(panic.as_ref());
            let _ = inner
                .die(Some(Error::Internal(format!("{task} task panicked: {msg}"))))
                .await;
        }
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
