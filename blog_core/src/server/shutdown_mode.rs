use std::time::Duration;

/// How a running [`Server`](super::Server) stops, see [`ServerHandle::shutdown`](super::ServerHandle::shutdown).
///
/// In both modes the server stops accepting new connections right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Let open connections finish their in-flight requests, for up to `timeout`.
    Graceful { timeout: Duration },
    /// Drop every open connection.
    Forced,
}

impl ShutdownMode {
    /// How long open connections are given to close on their own.
    ///
    /// `None` for a forced shutdown.
    pub fn grace_period(&self) -> Option<Duration> {
        match self {
            Self::Graceful { timeout } => Some(*timeout),
            Self::Forced => None,
        }
    }
}
