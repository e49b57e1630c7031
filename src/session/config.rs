use std::time::Duration;

use crate::frame::{DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE};

/// Session tunables. The defaults are the protocol's wire-level constants.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial flow-control window of every new stream, in bytes.
    pub initial_window_size: u32,

    /// Depth of the queue of remotely-opened streams awaiting `accept`.
    pub accept_queue_depth: usize,

    /// Depth of the outbound frame queue feeding the writer task.
    pub write_queue_depth: usize,

    /// How long the reader waits to offer a newly opened remote stream to a
    /// full accept queue before refusing the stream.
    ///
    /// The 5 ms default can be shorter than a scheduling quantum on a loaded
    /// host; raise it if acceptors are slow to keep up.
    pub accept_offer_timeout: Duration,

    /// Deadline for the best-effort GOAWAY sent while shutting down.
    pub goaway_send_timeout: Duration,

    /// Largest frame payload accepted from the peer. Outbound DATA is
    /// chunked to this size.
    pub max_frame_size: u32,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            accept_queue_depth: 256,
            write_queue_depth: 64,
            accept_offer_timeout: Duration::from_millis(5),
            goaway_send_timeout: Duration::from_millis(250),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
