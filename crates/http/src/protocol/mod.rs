//! Core HTTP/1.1 protocol types.
//!
//! - **Headers** ([`headers`]): [`Headers`], the case-insensitive field map and its line parser
//! - **Requests** ([`request`]): [`Request`], [`RequestLine`] and the [`RequestState`] machine
//! - **Payloads**: [`PayloadItem`], a chunk frame or the end of a chunked body
//! - **Errors**: [`ParseError`] for the request side, [`SendError`] for the response side,
//!   [`ServerError`] for binding, and the umbrella [`HttpError`]

pub mod headers;
pub use headers::Headers;

pub mod request;
pub use request::ALLOWED_METHODS;
pub use request::HTTP_VERSION;
pub use request::Request;
pub use request::RequestLine;
pub use request::RequestState;

mod payload;
pub use payload::PayloadItem;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::ServerError;
