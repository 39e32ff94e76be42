//! Serialization of the status line and header blocks of a response.
//!
//! The status line only ever carries one of [`SUPPORTED_STATUS`]; the header block is written
//! as `name: value\r\n` per field, in the map's iteration order, closed by a blank line. The
//! same block layout is used for trailers.

use bytes::{BufMut, BytesMut};
use http::StatusCode;
use std::io::Write;
use tokio_util::codec::Encoder;

use crate::ensure;
use crate::protocol::{Headers, SendError};

/// Status codes the writer knows how to emit.
pub const SUPPORTED_STATUS: [StatusCode; 3] = [StatusCode::OK, StatusCode::BAD_REQUEST, StatusCode::INTERNAL_SERVER_ERROR];

/// Room reserved up front for a status line.
const STATUS_LINE_SIZE: usize = 64;

/// Encodes `HTTP/1.1 <code> <reason>\r\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusLineEncoder;

impl Encoder<StatusCode> for StatusLineEncoder {
    type Error = SendError;

    /// Writes the status line, nothing is written for an unsupported status.
    fn encode(&mut self, status: StatusCode, dst: &mut BytesMut) -> Result<(), Self::Error> {
        ensure!(SUPPORTED_STATUS.contains(&status), SendError::UnsupportedStatus(status.as_u16()));
        let reason = status.canonical_reason().ok_or(SendError::UnsupportedStatus(status.as_u16()))?;

        dst.reserve(STATUS_LINE_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason)?;
        Ok(())
    }
}

/// Encodes a header or trailer block, including the closing blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl<'a> Encoder<&'a Headers> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, headers: &'a Headers, dst: &mut BytesMut) -> Result<(), Self::Error> {
        for (name, value) in headers.iter() {
            dst.reserve(name.len() + value.len() + 4);
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// `io::Write` adapter appending to a `BytesMut` that already has room reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
