use std::time::Duration;

use crate::role::Role;
use crate::session::{Session, SessionConfig};
use crate::transport::Transport;

/// Configures and constructs sessions.
///
/// ```no_run
/// # async fn demo(tcp: tokio::net::TcpStream) {
/// use muxado::SessionBuilder;
///
/// let mut builder = SessionBuilder::new();
/// builder.initial_window_size(256 * 1024);
/// let session = builder.client(tcp);
/// # let _ = session;
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> SessionBuilder {
        SessionBuilder {
            config: SessionConfig::default(),
        }
    }

    // ===== Flow control =====

    /// Sets the initial flow-control window of every new stream.
    pub fn initial_window_size(&mut self, size: u32) -> &mut Self {
        self.config.initial_window_size = size;
        self
    }

    /// Sets the size (in octets) of the largest frame payload this session
    /// accepts. Outbound stream data is broken into frames no larger than
    /// this.
    pub fn max_frame_size(&mut self, max: u32) -> &mut Self {
        self.config.max_frame_size = max;
        self
    }

    // ===== Queues =====

    /// Sets how many remotely-opened streams may sit unaccepted before new
    /// ones are refused.
    pub fn accept_queue_depth(&mut self, depth: usize) -> &mut Self {
        self.config.accept_queue_depth = depth;
        self
    }

    /// Sets the depth of the outbound frame queue feeding the writer task.
    pub fn write_queue_depth(&mut self, depth: usize) -> &mut Self {
        self.config.write_queue_depth = depth;
        self
    }

    /// Sets how long the session waits to hand a new remote stream to a full
    /// accept queue before refusing it.
    pub fn accept_offer_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.accept_offer_timeout = timeout;
        self
    }

    // ===== Construction =====

    /// Build a client session over `io`.
    pub fn client<T: Transport>(&self, io: T) -> Session {
        Session::with_config(io, Role::Client, self.config.clone())
    }

    /// Build a server session over `io`.
    pub fn server<T: Transport>(&self, io: T) -> Session {
        Session::with_config(io, Role::Server, self.config.clone())
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        SessionBuilder::new()
    }
}
