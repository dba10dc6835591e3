//! An HTTP server to handle incoming connections.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//! use blog_core::http::Response;
//! use blog_core::server::{Server, ShutdownMode};
//!
//! #[derive(Clone)]
//! struct ApplicationState;
//!
//! async fn handler(
//!     _request: http::Request<hyper::body::Incoming>,
//!     _state: ApplicationState,
//! ) -> Response {
//!     Response::ok()
//! }
//!
//! # async fn t() -> std::io::Result<()> {
//! let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
//! let handle = Server::new().bind(addr).await?.serve(handler, ApplicationState);
//! handle
//!     .shutdown(ShutdownMode::Graceful {
//!         timeout: std::time::Duration::from_secs(30),
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```
use std::future::Future;
use std::net::SocketAddr;

pub use incoming::IncomingStream;
pub use server_handle::ServerHandle;
pub use shutdown_mode::ShutdownMode;

use crate::http::Response;

mod incoming;
mod server_handle;
mod shutdown_mode;

/// An HTTP server to handle incoming connections.
///
/// Connections are served on the current `tokio` runtime, one task per connection.
/// The protocol (HTTP/1.1 or HTTP/2) is detected automatically.
#[must_use = "You must call `serve` on a `Server` to start listening for incoming connections"]
#[derive(Debug, Default)]
pub struct Server {
    incoming: Vec<IncomingStream>,
}

impl Server {
    /// Create a new [`Server`] that isn't listening on any socket yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the server to the given address: the server will accept incoming connections from
    /// this address when started.
    ///
    /// It can be called multiple times to listen on more than one address.
    pub async fn bind(self, addr: SocketAddr) -> std::io::Result<Self> {
        let incoming = IncomingStream::bind(addr).await?;
        Ok(self.listen(incoming))
    }

    /// Ask the server to process incoming connections from the provided [`IncomingStream`].
    pub fn listen(mut self, incoming: IncomingStream) -> Self {
        self.incoming.push(incoming);
        self
    }

    /// Start listening for incoming connections.
    ///
    /// Every incoming request is dispatched to `handler`, together with a clone
    /// of `application_state`.
    ///
    /// It returns a [`ServerHandle`] to control the server.
    pub fn serve<HandlerFuture, ApplicationState>(
        self,
        handler: fn(http::Request<hyper::body::Incoming>, ApplicationState) -> HandlerFuture,
        application_state: ApplicationState,
    ) -> ServerHandle
    where
        HandlerFuture: Future<Output = Response> + Send + 'static,
        ApplicationState: Clone + Send + Sync + 'static,
    {
        if self.incoming.is_empty() {
            tracing::warn!("The server is not listening on any socket, no connection will ever be accepted");
        }
        ServerHandle::new(self.incoming, handler, application_state)
    }
}
