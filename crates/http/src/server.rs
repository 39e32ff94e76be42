//! TCP listener running one [`HttpConnection`] per accepted connection.
//!
//! [`Server::serve`] binds a loopback port and returns at once; connections are accepted on a
//! background task until [`Server::close`] is called. Closing only stops the listener,
//! connections already accepted finish on their own.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;
use crate::protocol::ServerError;

/// A running listener.
///
/// Dropping a `Server` without calling [`close`](Self::close) also stops the listener, but
/// without waiting for the accept task to finish.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_task: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds `127.0.0.1:port` and starts accepting connections for `handler`.
    ///
    /// Port `0` picks a free port, see [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the port can't be bound.
    pub async fn serve<H>(port: u16, handler: H) -> Result<Self, ServerError>
    where
        H: Handler + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|source| ServerError::Bind { port, source })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind { port, source })?;
        info!(%local_addr, "start listening");

        let running = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());
        let accept_task = tokio::spawn(accept_loop(listener, Arc::new(handler), Arc::clone(&running), Arc::clone(&shutdown)));

        Ok(Self { local_addr, running, shutdown, accept_task: Some(accept_task) })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops accepting connections and waits until the listener is released.
    ///
    /// Connections that were already accepted keep being served. Calling `close` again does
    /// nothing.
    pub async fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();

        if let Some(accept_task) = self.accept_task.take() {
            if let Err(e) = accept_task.await {
                error!(cause = %e, "accept task failed");
            }
            info!(local_addr = %self.local_addr, "stopped listening");
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.accept_task.is_some() {
            self.running.store(false, Ordering::SeqCst);
            self.shutdown.notify_one();
        }
    }
}

async fn accept_loop<H>(listener: TcpListener, handler: Arc<H>, running: Arc<AtomicBool>, shutdown: Arc<Notify>)
where
    H: Handler + 'static,
{
    loop {
        let accepted = select! {
            _ = shutdown.notified() => break,
            accepted = listener.accept() => accepted,
        };

        let (tcp_stream, remote_addr) = match accepted {
            Ok(stream_and_addr) => stream_and_addr,
            Err(_) if !running.load(Ordering::SeqCst) => break,
            Err(e) => {
                error!(cause = %e, "failed to accept, stop listening");
                break;
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::new(reader, writer);
            match connection.process(handler).await {
                Ok(_) => info!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => warn!(%remote_addr, cause = %e, "can't close connection"),
            }
        });
    }
}
