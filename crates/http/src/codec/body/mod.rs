//! Chunked transfer coding.
//!
//! - [`ChunkedEncoder`]: frames response payload as `hex-size CRLF data CRLF`, ending with `0 CRLF`
//! - [`ChunkedDecoder`]: reads such frames back, collecting any trailer fields
//!
//! Request bodies are framed by `content-length` only and are collected by the
//! [`RequestDecoder`](crate::codec::RequestDecoder) itself.

mod chunked_decoder;
mod chunked_encoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
