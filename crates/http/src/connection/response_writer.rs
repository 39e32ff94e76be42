use bytes::{Bytes, BytesMut};
use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

use crate::codec::{ChunkedEncoder, HeaderEncoder, StatusLineEncoder};
use crate::protocol::{Headers, PayloadItem, SendError};

const INIT_BUFFER_SIZE: usize = 4 * 1024;

/// Starting header set for a response with a `content-length` body on a one-shot connection.
///
/// Callers extend or override it, e.g. with a `content-type`, before passing it to
/// [`ResponseWriter::write_headers`].
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.insert("content-length", content_length.to_string());
    headers.insert("connection", "close");
    headers
}

/// Where a [`ResponseWriter`] is in the response write sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    StatusLine,
    Headers,
    /// Header block written, the body framing is not chosen yet
    Body,
    PlainBody,
    ChunkedBody,
    ChunkedDone,
    Done,
}

impl WriterState {
    fn describe(self) -> &'static str {
        match self {
            WriterState::StatusLine => "expects the status line",
            WriterState::Headers => "expects the header block",
            WriterState::Body => "expects the body",
            WriterState::PlainBody => "is writing a plain body",
            WriterState::ChunkedBody => "is writing a chunked body",
            WriterState::ChunkedDone => "has finished the chunked body",
            WriterState::Done => "has written the trailers",
        }
    }
}

/// Writes one response onto a connection.
///
/// Calls must follow the response layout:
///
/// 1. [`write_status_line`](Self::write_status_line)
/// 2. [`write_headers`](Self::write_headers), exactly once
/// 3. either [`write_body`](Self::write_body), or any number of
///    [`write_chunked_body`](Self::write_chunked_body) followed by
///    [`write_chunked_body_done`](Self::write_chunked_body_done)
/// 4. optionally [`write_trailers`](Self::write_trailers) after a chunked body
///
/// A call out of this order fails with [`SendError::OutOfOrder`] and writes nothing. Every call
/// flushes what it wrote, so a transport failure surfaces as [`SendError::Io`] on the call that
/// hit it; the response should be abandoned at that point.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    state: WriterState,
    chunked_encoder: ChunkedEncoder,
    /// Whether the header block carried a `trailer` field
    trailers_announced: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(buffer_size),
            state: WriterState::StatusLine,
            chunked_encoder: ChunkedEncoder::new(),
            trailers_announced: false,
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Whether a status line has gone out on this writer.
    pub fn is_started(&self) -> bool {
        self.state != WriterState::StatusLine
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    ///
    /// Only 200, 400 and 500 are supported; any other code fails with
    /// [`SendError::UnsupportedStatus`] and nothing is written.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.expect("write the status line", &[WriterState::StatusLine])?;
        StatusLineEncoder.encode(status, &mut self.buffer)?;
        self.state = WriterState::Headers;
        self.flush().await
    }

    /// Writes the header block and the blank line ending it.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), SendError> {
        self.expect("write headers", &[WriterState::Headers])?;
        HeaderEncoder.encode(headers, &mut self.buffer)?;
        self.trailers_announced = headers.contains_key("trailer");
        self.state = WriterState::Body;
        self.flush().await
    }

    /// Writes payload bytes as they are, for bodies framed by `content-length`.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.expect("write a plain body", &[WriterState::Body, WriterState::PlainBody])?;
        self.state = WriterState::PlainBody;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        Ok(body.len())
    }

    /// Writes one chunked frame holding `chunk`. An empty chunk writes nothing.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, SendError> {
        self.expect("write a chunk", &[WriterState::Body, WriterState::ChunkedBody])?;
        self.chunked_encoder.encode(PayloadItem::Chunk(chunk), &mut self.buffer)?;
        self.state = WriterState::ChunkedBody;
        self.flush().await?;
        Ok(chunk.len())
    }

    /// Writes the zero-length frame ending a chunked body.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), SendError> {
        self.expect("finish the chunked body", &[WriterState::Body, WriterState::ChunkedBody])?;
        self.chunked_encoder.encode(PayloadItem::<Bytes>::Eof, &mut self.buffer)?;
        trace!(payload_size = self.chunked_encoder.send_size(), "finished chunked body");
        self.state = WriterState::ChunkedDone;
        self.flush().await
    }

    /// Writes trailer fields and the blank line after them.
    ///
    /// Clients only look for trailers the header block named in a `trailer` field.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), SendError> {
        self.expect("write trailers", &[WriterState::ChunkedDone])?;
        if !self.trailers_announced {
            warn!("writing trailers that the header block didn't announce");
        }
        HeaderEncoder.encode(trailers, &mut self.buffer)?;
        self.state = WriterState::Done;
        self.flush().await
    }

    /// Writes the closing CRLF and shuts the write side of the connection down.
    ///
    /// Called once the handler has returned, whatever it wrote.
    pub async fn close(&mut self) -> Result<(), SendError> {
        self.buffer.extend_from_slice(b"\r\n");
        self.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    fn expect(&self, call: &'static str, allowed: &[WriterState]) -> Result<(), SendError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SendError::out_of_order(call, self.state.describe()))
        }
    }

    async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let result = self.writer.write_all(&self.buffer).await;
        self.buffer.clear();
        result?;
        Ok(self.writer.flush().await?)
    }
}
