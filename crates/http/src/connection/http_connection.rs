use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

use crate::connection::{RequestReader, ResponseWriter};
use crate::handler::Handler;
use crate::protocol::HttpError;

/// A one-shot HTTP connection: one request is read, one response is written, then the
/// connection is closed.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: RequestReader<R>,
    writer: ResponseWriter<W>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader: RequestReader::new(reader), writer: ResponseWriter::new(writer) }
    }

    /// Reads the request, lets `handler` respond, then closes the connection.
    ///
    /// A request that fails to parse still reaches the handler as an `Err`. Handler errors and
    /// panics are logged, and the connection is closed in every case.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ResponseError`] only when the closing write or the shutdown fails.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let request = self.reader.read_request().await;
        match &request {
            Ok(request) => info!(method = ?request.method(), target = ?request.target(), "received request"),
            Err(e) => warn!(cause = %e, "can't read request"),
        }

        match AssertUnwindSafe(handler.call(&mut self.writer, request)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handler failed");
            }
            Err(_) => error!("handler panicked"),
        }

        self.writer.close().await?;
        Ok(())
    }
}
