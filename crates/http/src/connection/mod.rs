//! Connection handling
//!
//! Every connection carries exactly one exchange: the request is read with a [`RequestReader`],
//! the handler answers through a [`ResponseWriter`], and the connection is closed afterwards.
//!
//! # Components
//!
//! - [`HttpConnection`]: drives one exchange from the first byte read to the shutdown
//! - [`RequestReader`]: reads a request through a growable receive buffer
//! - [`ResponseWriter`]: writes the status line, headers, body and trailers in order

mod http_connection;
mod request_reader;
mod response_writer;

pub use http_connection::HttpConnection;
pub use request_reader::{INITIAL_BUFFER_SIZE, RequestReader};
pub use response_writer::{ResponseWriter, default_headers};
