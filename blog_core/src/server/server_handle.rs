use std::convert::Infallible;
use std::future::{Future, IntoFuture, poll_fn};
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::Poll;

use bytes::Bytes;
use http_body_util::Full;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};

use super::{IncomingStream, ShutdownMode};
use crate::http::Response;

/// A handle to a running [`Server`](super::Server).
///
/// # Example: waiting for the server to shut down
///
/// You can just `.await` the [`ServerHandle`] to wait for the server to shut down:
///
/// ```rust,no_run
/// use std::net::SocketAddr;
/// use blog_core::server::Server;
///
/// # #[derive(Clone)] struct ApplicationState;
/// # async fn router(_req: http::Request<hyper::body::Incoming>, _state: ApplicationState) -> blog_core::http::Response { todo!() }
/// # async fn t() -> std::io::Result<()> {
/// # let application_state = ApplicationState;
/// let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
///
/// let server_handle = Server::new()
///     .bind(addr)
///     .await?
///     .serve(router, application_state);
/// // Wait until the server shuts down.
/// server_handle.await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerHandle {
    command_outbox: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    pub(super) fn new<HandlerFuture, ApplicationState>(
        incoming: Vec<IncomingStream>,
        handler: fn(http::Request<hyper::body::Incoming>, ApplicationState) -> HandlerFuture,
        application_state: ApplicationState,
    ) -> Self
    where
        HandlerFuture: Future<Output = Response> + Send + 'static,
        ApplicationState: Clone + Send + Sync + 'static,
    {
        let (command_outbox, command_inbox) = mpsc::channel(32);
        let acceptor = Acceptor {
            command_inbox,
            incoming,
            handler,
            application_state,
        };
        tokio::spawn(acceptor.run());
        Self { command_outbox }
    }

    /// Instruct the [`Server`](super::Server) to stop accepting new connections.
    ///
    /// It resolves once the shutdown sequence has completed.
    #[doc(alias("stop"))]
    pub async fn shutdown(self, mode: ShutdownMode) {
        let (completion_notifier, completion) = oneshot::channel();
        if self
            .command_outbox
            .send(ServerCommand::Shutdown {
                completion_notifier,
                mode,
            })
            .await
            .is_ok()
        {
            // Sending only fails if the acceptor is already gone: nothing to wait for.
            let _ = completion.await;
        }
    }
}

impl IntoFuture for ServerHandle {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send + Sync + 'static>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.command_outbox.closed().await })
    }
}

#[derive(Debug)]
enum ServerCommand {
    Shutdown {
        completion_notifier: oneshot::Sender<()>,
        mode: ShutdownMode,
    },
}

enum AcceptorInboxMessage {
    ServerCommand(ServerCommand),
    Connection(Option<Result<(IncomingStream, TcpStream, SocketAddr), JoinError>>),
}

type Accepted = (IncomingStream, TcpStream, SocketAddr);

struct Acceptor<HandlerFuture, ApplicationState> {
    command_inbox: mpsc::Receiver<ServerCommand>,
    incoming: Vec<IncomingStream>,
    handler: fn(http::Request<hyper::body::Incoming>, ApplicationState) -> HandlerFuture,
    application_state: ApplicationState,
}

impl<HandlerFuture, ApplicationState> Acceptor<HandlerFuture, ApplicationState>
where
    HandlerFuture: Future<Output = Response> + Send + 'static,
    ApplicationState: Clone + Send + Sync + 'static,
{
    /// Accept incoming connections and spawn a task to serve each of them.
    ///
    /// Constraint: this method **must not panic**.
    async fn run(self) {
        /// Accept a connection from the given [`IncomingStream`].
        /// If accepting a certain connection fails, log the error and keep trying with the next connection.
        async fn accept_connection(incoming: IncomingStream) -> Accepted {
            loop {
                match incoming.accept().await {
                    Ok((connection, remote_peer)) => return (incoming, connection, remote_peer),
                    Err(e) => {
                        tracing::error!(error.msg = %e, error.details = ?e, "Failed to accept connection");
                        continue;
                    }
                }
            }
        }

        let Self {
            mut command_inbox,
            incoming,
            handler,
            application_state,
        } = self;

        let connection_builder = auto::Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        let mut incoming_join_set = JoinSet::new();
        for incoming in incoming.into_iter() {
            incoming_join_set.spawn(accept_connection(incoming));
        }

        loop {
            let message =
                poll_fn(|cx| Self::poll_inboxes(cx, &mut command_inbox, &mut incoming_join_set))
                    .await;
            match message {
                AcceptorInboxMessage::ServerCommand(ServerCommand::Shutdown {
                    completion_notifier,
                    mode,
                }) => {
                    // Cancelling the accepting tasks closes the listening sockets.
                    incoming_join_set.abort_all();
                    while incoming_join_set.join_next().await.is_some() {}
                    Self::shutdown(mode, graceful, connections).await;
                    let _ = completion_notifier.send(());
                    return;
                }
                AcceptorInboxMessage::Connection(Some(Ok((incoming, connection, remote_peer)))) => {
                    // Keep accepting connections from the same socket.
                    incoming_join_set.spawn(accept_connection(incoming));

                    let application_state = application_state.clone();
                    let service = hyper::service::service_fn(move |request| {
                        let response = handler(request, application_state.clone());
                        async move {
                            let response: http::Response<Full<Bytes>> = response.await.into();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let connection = connection_builder
                        .serve_connection(TokioIo::new(connection), service)
                        .into_owned();
                    let connection = graceful.watch(connection);
                    connections.spawn(async move {
                        if let Err(e) = connection.await {
                            tracing::debug!(
                                error.msg = %e,
                                remote_peer = %remote_peer,
                                "Failed to serve connection"
                            );
                        }
                    });
                    // Reap the tasks for connections that have already been closed.
                    while connections.try_join_next().is_some() {}
                }
                AcceptorInboxMessage::Connection(Some(Err(e))) => {
                    // The accepting task panicked or was cancelled.
                    tracing::error!(
                        error.msg = %e,
                        error.details = ?e,
                        "Failed to accept new connections. The acceptor will exit now."
                    );
                    return;
                }
                AcceptorInboxMessage::Connection(None) => {
                    // Not listening on any socket.
                    // Wait for a shutdown command, or for all handles to be dropped.
                    if let Some(ServerCommand::Shutdown {
                        completion_notifier,
                        mode,
                    }) = command_inbox.recv().await
                    {
                        Self::shutdown(mode, graceful, connections).await;
                        let _ = completion_notifier.send(());
                    }
                    return;
                }
            }
        }
    }

    /// Check if there is work to be done.
    fn poll_inboxes(
        cx: &mut std::task::Context<'_>,
        server_command_inbox: &mut mpsc::Receiver<ServerCommand>,
        incoming_join_set: &mut JoinSet<Accepted>,
    ) -> Poll<AcceptorInboxMessage> {
        // Shutdown commands take priority over incoming connections.
        if let Poll::Ready(Some(message)) = server_command_inbox.poll_recv(cx) {
            return Poll::Ready(AcceptorInboxMessage::ServerCommand(message));
        }
        if let Poll::Ready(message) = incoming_join_set.poll_join_next(cx) {
            return Poll::Ready(AcceptorInboxMessage::Connection(message));
        }
        Poll::Pending
    }

    async fn shutdown(mode: ShutdownMode, graceful: GracefulShutdown, mut connections: JoinSet<()>) {
        if let Some(timeout) = mode.grace_period() {
            tokio::select! {
                _ = graceful.shutdown() => {
                    tracing::info!("All open connections have been closed");
                }
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(
                        timeout = ?timeout,
                        "Graceful shutdown timed out, dropping the connections that are still open"
                    );
                }
            }
        }
        connections.abort_all();
        while connections.join_next().await.is_some() {}
    }
}
