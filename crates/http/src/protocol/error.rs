use std::io;
use thiserror::Error;

use crate::protocol::Request;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http version: {0:?}, only HTTP/1.1 is supported")]
    InvalidVersion(String),

    #[error("invalid http method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body is longer than content-length, declared: {declared}, received: {received}")]
    BodyTooLong { declared: usize, received: usize, request: Box<Request> },

    #[error("body is shorter than content-length, declared: {declared}, received: {received}")]
    BodyTooShort { declared: usize, received: usize, request: Box<Request> },

    #[error("invalid chunked body: {reason}")]
    InvalidChunk { reason: String },

    #[error("stream ended before the request line was read")]
    IncompleteRequest,

    #[error("read returned no bytes before end of stream")]
    StalledRead,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The request read before the body turned out to be the wrong length.
    ///
    /// Its request line and headers are complete, the body holds what was received.
    pub fn partial_request(&self) -> Option<&Request> {
        match self {
            Self::BodyTooLong { request, .. } | Self::BodyTooShort { request, .. } => Some(&**request),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("unsupported status code: {0}")]
    UnsupportedStatus(u16),

    #[error("can't {call} while the writer {state}")]
    OutOfOrder { call: &'static str, state: &'static str },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn out_of_order(call: &'static str, state: &'static str) -> Self {
        Self::OutOfOrder { call, state }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't bind 127.0.0.1:{port}, cause: {source}")]
    Bind { port: u16, source: io::Error },
}
