use std::io::ErrorKind;

use bytes::BytesMut;
use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::codec::RequestDecoder;
use crate::protocol::{ParseError, Request};

/// Size the receive buffer starts at, it doubles whenever a read needs more room.
pub const INITIAL_BUFFER_SIZE: usize = 8;

/// Upper bound on the body bytes one read asks for, so a large `content-length` alone doesn't
/// allocate the whole body up front.
const MAX_BODY_READ: usize = 64 * 1024;

/// Reads one [`Request`] from a byte source.
///
/// Bytes are read into the unfilled tail of a growable buffer and handed to a
/// [`RequestDecoder`]; whatever the decoder consumed is dropped by shifting the remaining tail to
/// the front of the buffer before the next read.
#[derive(Debug)]
pub struct RequestReader<R> {
    reader: R,
    buffer: BytesMut,
    /// Number of bytes at the front of `buffer` holding unconsumed input
    filled: usize,
}

impl<R> RequestReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, INITIAL_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buffer: BytesMut::zeroed(capacity.max(1)), filled: 0 }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Current size of the receive buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reads until a full request is decoded or the source ends.
    ///
    /// When the source ends early, the request decoded so far is checked by
    /// [`RequestDecoder::finish`], so a missing request line or a short body is still an error.
    ///
    /// # Errors
    ///
    /// - any [`ParseError`] raised by the decoder
    /// - [`ParseError::StalledRead`] if the source hands back no bytes without ending
    /// - [`ParseError::Io`] for other read failures
    pub async fn read_request(&mut self) -> Result<Request, ParseError> {
        let mut decoder = RequestDecoder::new();

        while !decoder.is_done() {
            // while reading the body, leave room for one byte past the declared length so a
            // request that overruns content-length is seen by the decoder
            let wanted = decoder.body_remaining().map_or(1, |remaining| remaining.min(MAX_BODY_READ) + 1);
            self.reserve(wanted);

            let read = match self.reader.read(&mut self.buffer[self.filled..]).await {
                Ok(0) => {
                    trace!(state = ?decoder.state(), "byte source ended");
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Err(ParseError::StalledRead),
                Err(e) => return Err(e.into()),
            };
            self.filled += read;

            let consumed = decoder.decode(&self.buffer[..self.filled])?;
            self.buffer.copy_within(consumed..self.filled, 0);
            self.filled -= consumed;
        }

        if decoder.is_done() {
            self.check_trailing(&mut decoder)?;
        }
        decoder.finish()
    }

    /// Hands the decoder whatever is left in the buffer plus any bytes the source has ready
    /// without waiting, so a body overrunning `content-length` is rejected even when the
    /// request finished exactly at the end of a read.
    fn check_trailing(&mut self, decoder: &mut RequestDecoder) -> Result<(), ParseError> {
        if decoder.request().content_length().is_none() {
            return Ok(());
        }

        self.reserve(1);
        if let Some(Ok(read)) = self.reader.read(&mut self.buffer[self.filled..]).now_or_never() {
            self.filled += read;
        }
        decoder.check_trailing(&self.buffer[..self.filled])
    }

    /// Doubles the buffer until at least `additional` bytes are free after the filled part.
    fn reserve(&mut self, additional: usize) {
        let wanted = self.filled + additional;
        if wanted <= self.buffer.len() {
            return;
        }

        let mut new_len = self.buffer.len();
        while new_len < wanted {
            new_len *= 2;
        }
        self.buffer.resize(new_len, 0);
        trace!(capacity = new_len, "grew receive buffer");
    }
}
