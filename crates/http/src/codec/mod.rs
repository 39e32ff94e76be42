//! Byte-level encoding and decoding of HTTP/1.1 messages
//!
//! - Request side:
//!   - [`RequestDecoder`]: incremental request-line / header / body state machine
//! - Response side:
//!   - [`StatusLineEncoder`] and [`HeaderEncoder`]: status line, header and trailer blocks
//!   - [`ChunkedEncoder`]: chunked transfer coding frames
//! - [`ChunkedDecoder`]: reads chunked frames and trailers back, for clients of this server
//!
//! The encoders implement [`tokio_util::codec::Encoder`] and write into a `BytesMut` that the
//! [`ResponseWriter`](crate::connection::ResponseWriter) flushes to the connection.

mod body;
mod header;
mod request_decoder;

pub use body::{ChunkedDecoder, ChunkedEncoder};
pub use header::{HeaderEncoder, SUPPORTED_STATUS, StatusLineEncoder};
pub use request_decoder::RequestDecoder;
