//! Decoder for the chunked transfer coding written by
//! [`ResponseWriter`](crate::connection::ResponseWriter).
//!
//! Frames look like `hex-size CRLF data CRLF`, the body ends with a zero-size frame, optionally
//! followed by trailer fields and a blank line. Chunk extensions are not supported and are
//! rejected.

use bytes::{Buf, Bytes, BytesMut};
use std::task::Poll;
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

use crate::protocol::{Headers, ParseError, PayloadItem};

/// A decoder turning a chunked byte stream back into payload frames.
///
/// Trailer fields sent after the last frame are collected into [`ChunkedDecoder::trailers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    /// Set once at least one size digit was read for the current frame
    has_size: bool,
    trailers: Headers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Read trailer fields up to the blank line
    Trailers,
    /// Nothing more to read
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0, has_size: false, trailers: Headers::new() }
    }

    /// Trailer fields received after the terminating frame.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn is_finished(&self) -> bool {
        self.state == End
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes the next frame from `src`.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` for frame data, possibly a part of one frame
    /// - `Ok(Some(PayloadItem::Eof))` once the terminator and any trailers are read
    /// - `Ok(None)` when more data is needed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                return Ok(Some(PayloadItem::Eof));
            }

            if self.state == Trailers {
                let (consumed, done) = self.trailers.parse(src)?;
                src.advance(consumed);
                if done {
                    trace!(trailers = self.trailers.len(), "finished reading chunked data");
                    self.state = End;
                    continue;
                }
                if consumed == 0 {
                    return Ok(None);
                }
                continue;
            }

            if src.is_empty() {
                return Ok(None);
            }

            let mut buf = None;
            self.state = match self.step(src, &mut buf) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = buf {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }

    /// A stream may end right after the `0\r\n` terminator when no trailers were sent.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if self.state == Trailers && src.is_empty() => {
                self.state = End;
                Ok(Some(PayloadItem::Eof))
            }
            None => Err(ParseError::invalid_chunk(format!("stream ended inside the chunked body, state {:?}", self.state))),
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.is_empty() {
            return Poll::Pending;
        }
        $src.get_u8()
    }};
}

impl ChunkedDecoder {
    fn step(&mut self, src: &mut BytesMut, buf: &mut Option<Bytes>) -> Poll<Result<ChunkedState, ParseError>> {
        match self.state {
            Size => self.read_size(src),
            SizeLf => self.read_size_lf(src),
            Body => self.read_body(src, buf),
            BodyCr => match try_next_byte!(src) {
                b'\r' => Poll::Ready(Ok(BodyLf)),
                _ => Poll::Ready(Err(ParseError::invalid_chunk("missing CR after chunk data"))),
            },
            BodyLf => match try_next_byte!(src) {
                b'\n' => Poll::Ready(Ok(Size)),
                _ => Poll::Ready(Err(ParseError::invalid_chunk("missing LF after chunk data"))),
            },
            Trailers => Poll::Ready(Ok(Trailers)),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Reads the hex size digit by digit until the CR ending the size line.
    fn read_size(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        let digit = match try_next_byte!(src) {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b + 10 - b'a',
            b @ b'A'..=b'F' => b + 10 - b'A',
            b'\r' if self.has_size => return Poll::Ready(Ok(SizeLf)),
            b';' => return Poll::Ready(Err(ParseError::invalid_chunk("chunk extensions are not supported"))),
            b => return Poll::Ready(Err(ParseError::invalid_chunk(format!("invalid chunk size byte {:?}", char::from(b))))),
        };

        let size = self.remaining_size.checked_mul(16).and_then(|size| size.checked_add(u64::from(digit)));
        match size {
            Some(size) => {
                self.remaining_size = size;
                self.has_size = true;
                Poll::Ready(Ok(Size))
            }
            None => Poll::Ready(Err(ParseError::invalid_chunk("chunk size overflow"))),
        }
    }

    fn read_size_lf(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                self.has_size = false;
                if self.remaining_size == 0 { Poll::Ready(Ok(Trailers)) } else { Poll::Ready(Ok(Body)) }
            }
            _ => Poll::Ready(Err(ParseError::invalid_chunk("missing LF after chunk size"))),
        }
    }

    fn read_body(&mut self, src: &mut BytesMut, buf: &mut Option<Bytes>) -> Poll<Result<ChunkedState, ParseError>> {
        let remaining = usize::try_from(self.remaining_size).unwrap_or(usize::MAX);
        let read_size = remaining.min(src.len());

        self.remaining_size -= read_size as u64;
        *buf = Some(src.split_to(read_size).freeze());

        if self.remaining_size > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyCr)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> Vec<u8> {
        let mut body = Vec::new();
        loop {
            match decoder.decode_eof(buffer).unwrap() {
                Some(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Some(PayloadItem::Eof) => return body,
                None => panic!("decoder asked for more data at eof"),
            }
        }
    }

    #[test]
    fn test_basic() {
        let mut buffer = BytesMut::from(&b"10\r\n1234567890abcdef\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_chunk());
        assert_eq!(&item.as_bytes().unwrap()[..], b"1234567890abcdef");

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_eof());
        assert!(decoder.is_finished());
        assert!(buffer.is_empty());
    }

    #[test]
    fn terminator_without_trailers_at_eof() {
        let mut buffer = BytesMut::from(&b"3\r\nabc\r\n2\r\nde\r\n0\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(collect(&mut decoder, &mut buffer), b"abcde");
        assert!(decoder.trailers().is_empty());
    }

    #[test]
    fn terminator_needs_blank_line_before_eof() {
        let mut buffer = BytesMut::from(&b"2\r\nde\r\n0\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn chunks_with_trailers() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n0\r\nX-Content-Length: 5\r\nX-Checksum: abc\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(collect(&mut decoder, &mut buffer), b"hello");
        assert_eq!(decoder.trailers().get("x-content-length"), Some("5"));
        assert_eq!(decoder.trailers().get("x-checksum"), Some("abc"));
    }

    #[test]
    fn incomplete_chunk() {
        let mut buffer = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"hel"));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"lo\r\n0\r\n\r\n");

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::copy_from_slice(b"lo"));
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn uppercase_hex_size() {
        let data = vec![b'A'; 0x1F];
        let mut buffer = BytesMut::from(&b"1F\r\n"[..]);
        buffer.extend_from_slice(&data);
        buffer.extend_from_slice(b"\r\n0\r\n\r\n");

        assert_eq!(collect(&mut ChunkedDecoder::new(), &mut buffer), data);
    }

    #[test]
    fn invalid_chunk_size() {
        let mut buffer = BytesMut::from(&b"xyz\r\n"[..]);
        assert!(matches!(ChunkedDecoder::new().decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));

        let mut buffer = BytesMut::from(&b"\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }

    #[test]
    fn extensions_are_rejected() {
        let mut buffer = BytesMut::from(&b"5;chunk-ext=value\r\nhello\r\n0\r\n\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }

    #[test]
    fn missing_crlf_after_data() {
        let mut buffer = BytesMut::from(&b"5\r\nhelloBad"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn truncated_stream() {
        let mut buffer = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(decoder.decode_eof(&mut buffer).is_err());
    }
}
