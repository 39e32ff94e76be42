//! The application side of a connection.
//!
//! A [`Handler`] is called once per connection with the [`ResponseWriter`] for that connection
//! and the outcome of reading the request. A failed read is handed over too, so the handler
//! decides what a client sending a malformed request gets back.

use std::error::Error;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::connection::ResponseWriter;
use crate::protocol::{ParseError, Request};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Writes the response for `request` through `writer`.
    ///
    /// The connection writes its closing CRLF and shuts down once this returns, whether it
    /// returns an error or not, so a handler that writes nothing still ends the connection.
    ///
    /// When the body didn't match `content-length`, [`ParseError::partial_request`] still gives
    /// the request line and headers that were read.
    async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Result<Request, ParseError>) -> Result<(), Self::Error>
    where
        W: AsyncWrite + Unpin + Send;
}

