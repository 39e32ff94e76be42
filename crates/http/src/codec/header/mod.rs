//! Response-side header serialization.
//!
//! - [`StatusLineEncoder`]: writes `HTTP/1.1 <code> <reason>` for the supported status codes
//! - [`HeaderEncoder`]: writes a header or trailer block and its closing blank line
//!
//! Header *parsing* lives on [`Headers::parse`](crate::protocol::Headers::parse), since it runs
//! one line at a time against the request decoder's buffer.

mod header_encoder;

pub use header_encoder::HeaderEncoder;
pub use header_encoder::SUPPORTED_STATUS;
pub use header_encoder::StatusLineEncoder;
