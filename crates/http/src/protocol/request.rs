//! Parsed HTTP request types.
//!
//! A [`Request`] is filled in step by step by the
//! [`RequestDecoder`](crate::codec::RequestDecoder); its [`RequestState`] records how far the
//! decoder got and only ever moves forward.

use bytes::BytesMut;
use http::Method;

use crate::protocol::Headers;

/// The methods a request line may carry.
pub const ALLOWED_METHODS: [Method; 5] = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH];

/// The only protocol version accepted on the request line.
pub const HTTP_VERSION: &str = "1.1";

/// Progress of a request through the decoder.
///
/// The order of the variants is the order of the transitions, `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RequestState {
    #[default]
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

/// The `METHOD TARGET HTTP/VERSION` line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Whether `method` may appear on a request line.
    pub fn is_allowed_method(method: &Method) -> bool {
        ALLOWED_METHODS.contains(method)
    }
}

/// An HTTP/1.1 request read off a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub(crate) request_line: Option<RequestLine>,
    pub(crate) headers: Headers,
    pub(crate) body: BytesMut,
    pub(crate) state: RequestState,
    /// Value of the `content-length` header, resolved when the header block ends
    pub(crate) content_length: Option<usize>,
    /// Body bytes taken from the receive buffer so far
    pub(crate) body_consumed: usize,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the request line, `None` if the decoder never got a complete one.
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    pub fn method(&self) -> Option<&Method> {
        self.request_line.as_ref().map(|line| &line.method)
    }

    pub fn target(&self) -> Option<&str> {
        self.request_line.as_ref().map(|line| line.target.as_str())
    }

    pub fn version(&self) -> Option<&str> {
        self.request_line.as_ref().map(|line| line.version.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The declared body length, `None` when the request carried no `content-length`.
    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Body bytes taken off the wire so far.
    pub fn body_consumed(&self) -> usize {
        self.body_consumed
    }

    pub fn is_done(&self) -> bool {
        self.state == RequestState::Done
    }

    /// Moves the request forward, a transition back to an earlier state is ignored.
    pub(crate) fn advance(&mut self, next: RequestState) {
        debug_assert!(next >= self.state, "request state can't go back from {:?} to {next:?}", self.state);
        self.state = self.state.max(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_only_move_forward() {
        let mut request = Request::new();
        assert_eq!(request.state(), RequestState::Initialized);

        request.advance(RequestState::ParsingHeaders);
        request.advance(RequestState::Done);
        assert!(request.is_done());
    }

    #[test]
    fn empty_request_has_no_line() {
        let request = Request::new();
        assert!(request.request_line().is_none());
        assert!(request.method().is_none());
        assert!(request.target().is_none());
        assert!(request.body().is_empty());
        assert_eq!(request.content_length(), None);
    }
}
