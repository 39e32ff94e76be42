//! Incremental HTTP/1.1 request decoder
//!
//! [`RequestDecoder`] walks a [`Request`] through its [`RequestState`]s as bytes become
//! available. It never owns the receive buffer: every call to [`RequestDecoder::decode`] reports
//! exactly how many bytes it consumed from the front of the slice it was given, and the caller is
//! expected to drop those bytes before the next call.
//!
//! # State Machine
//!
//! - `Initialized`: waiting for a CRLF-terminated request line
//! - `ParsingHeaders`: one header line per step, a blank line ends the block
//! - `ParsingBody`: body bytes are collected until `content-length` is reached
//! - `Done`: nothing more is consumed
//!
//! # Example
//!
//! ```
//! use wire_http::codec::RequestDecoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let src = b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
//!
//! let consumed = decoder.decode(src).unwrap();
//! assert_eq!(consumed, src.len());
//!
//! let request = decoder.finish().unwrap();
//! assert_eq!(request.target(), Some("/submit"));
//! assert_eq!(request.body(), b"hello");
//! ```

use tracing::trace;

use crate::ensure;
use crate::protocol::headers::find_crlf;
use crate::protocol::{ALLOWED_METHODS, HTTP_VERSION, ParseError, Request, RequestLine, RequestState};

const CONTENT_LENGTH: &str = "content-length";

/// Drives a [`Request`] from raw bytes to [`RequestState::Done`].
#[derive(Debug, Default)]
pub struct RequestDecoder {
    request: Request,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request as decoded so far.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn state(&self) -> RequestState {
        self.request.state
    }

    pub fn is_done(&self) -> bool {
        self.request.is_done()
    }

    /// Body bytes still expected, `None` outside [`RequestState::ParsingBody`].
    pub fn body_remaining(&self) -> Option<usize> {
        match self.request.state {
            RequestState::ParsingBody => self.request.content_length.map(|declared| declared.saturating_sub(self.request.body.len())),
            _ => None,
        }
    }

    /// Decodes as much of `src` as the current bytes allow.
    ///
    /// # Returns
    ///
    /// The number of bytes consumed from the front of `src`. Zero means the decoder needs more
    /// input (or is already done); it is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for a malformed request line or header, an invalid
    /// `content-length`, or a body longer than the declared length.
    pub fn decode(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        let mut consumed = 0;
        loop {
            let state = self.request.state;
            let n = self.step(&src[consumed..])?;
            consumed += n;

            if self.request.state != state {
                trace!(from = ?state, to = ?self.request.state, "request state changed");
            }
            if self.is_done() || (n == 0 && self.request.state == state) {
                return Ok(consumed);
            }
        }
    }

    /// Finishes decoding once the input has ended, checking the request is complete.
    ///
    /// # Errors
    ///
    /// - [`ParseError::IncompleteRequest`] if no full request line was read
    /// - [`ParseError::BodyTooShort`] if fewer body bytes arrived than `content-length` declared
    pub fn finish(mut self) -> Result<Request, ParseError> {
        ensure!(self.request.request_line.is_some(), ParseError::IncompleteRequest);

        if let Some(declared) = self.request.content_length {
            let received = self.request.body.len();
            ensure!(received >= declared, ParseError::BodyTooShort { declared, received, request: Box::new(self.request) });
        }

        self.request.advance(RequestState::Done);
        Ok(self.request)
    }

    /// Checks bytes that arrived after the request was already complete.
    ///
    /// Without a `content-length` the request has no body and `extra` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BodyTooLong`] if a `content-length` was declared and `extra` is not
    /// empty.
    pub fn check_trailing(&mut self, extra: &[u8]) -> Result<(), ParseError> {
        if let Some(declared) = self.request.content_length {
            let received = self.request.body.len() + extra.len();
            ensure!(extra.is_empty(), ParseError::BodyTooLong { declared, received, request: self.take_request() });
        }
        Ok(())
    }

    fn take_request(&mut self) -> Box<Request> {
        Box::new(std::mem::take(&mut self.request))
    }

    fn step(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        match self.request.state {
            RequestState::Initialized => {
                let Some((request_line, consumed)) = parse_request_line(src)? else {
                    return Ok(0);
                };
                self.request.request_line = Some(request_line);
                self.request.advance(RequestState::ParsingHeaders);
                Ok(consumed)
            }

            RequestState::ParsingHeaders => {
                let (consumed, done) = self.request.headers.parse(src)?;
                if done {
                    self.enter_body()?;
                }
                Ok(consumed)
            }

            RequestState::ParsingBody => {
                if src.is_empty() {
                    return Ok(0);
                }
                // content_length is always resolved before entering this state
                let declared = self.request.content_length.unwrap_or_default();

                self.request.body.extend_from_slice(src);
                self.request.body_consumed += src.len();

                let received = self.request.body.len();
                ensure!(received <= declared, ParseError::BodyTooLong { declared, received, request: self.take_request() });
                if received == declared {
                    self.request.advance(RequestState::Done);
                }
                Ok(src.len())
            }

            RequestState::Done => Ok(0),
        }
    }

    /// Resolves the body framing once the header block is complete.
    fn enter_body(&mut self) -> Result<(), ParseError> {
        let Some(value) = self.request.headers.get(CONTENT_LENGTH) else {
            self.request.advance(RequestState::Done);
            return Ok(());
        };

        let declared = parse_content_length(value)?;
        trace!(content_length = declared, "request declares a body");
        self.request.content_length = Some(declared);

        if declared == 0 {
            self.request.advance(RequestState::Done);
        } else {
            self.request.advance(RequestState::ParsingBody);
        }
        Ok(())
    }
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    ensure!(
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        ParseError::invalid_content_length(format!("value {value:?} is not a non-negative integer"))
    );
    value.parse::<usize>().map_err(|e| ParseError::invalid_content_length(format!("value {value:?} can't be parsed: {e}")))
}

/// Parses `METHOD TARGET HTTP/1.1\r\n` from the front of `src`.
///
/// Returns `Ok(None)` when no CRLF is buffered yet.
fn parse_request_line(src: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(src) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&src[..line_end]).map_err(|e| ParseError::invalid_request_line(format!("not utf-8: {e}")))?;

    let parts: Vec<&str> = line.split(' ').collect();
    let (method, target, version) = match parts.as_slice() {
        [method, target, version] => (*method, *target, *version),
        _ => return Err(ParseError::invalid_request_line(format!("expect 3 parts, got {}: {line:?}", parts.len()))),
    };

    let version = match version.split_once('/') {
        Some(("HTTP", version)) => version,
        _ => return Err(ParseError::InvalidVersion(version.to_string())),
    };
    ensure!(version == HTTP_VERSION, ParseError::InvalidVersion(version.to_string()));

    let method = ALLOWED_METHODS
        .iter()
        .find(|allowed| allowed.as_str() == method)
        .cloned()
        .ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;

    check_target(target)?;

    let request_line = RequestLine { method, target: target.to_string(), version: version.to_string() };
    Ok(Some((request_line, line_end + 2)))
}

fn check_target(target: &str) -> Result<(), ParseError> {
    ensure!(!target.is_empty(), ParseError::InvalidTarget(target.to_string()));
    ensure!(!target.chars().any(char::is_whitespace), ParseError::InvalidTarget(target.to_string()));
    ensure!(target.starts_with('/') || target == "*", ParseError::InvalidTarget(target.to_string()));
    Ok(())
}
