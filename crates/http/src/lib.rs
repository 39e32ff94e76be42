//! A small HTTP/1.1 engine
//!
//! This crate reads one request per connection, hands it to a [`handler::Handler`] together with
//! a [`connection::ResponseWriter`], and closes the connection once the handler returns. It is
//! built on top of tokio and parses requests incrementally, so a request may arrive in reads of
//! any size.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use tokio::io::AsyncWrite;
//! use tracing::Level;
//! use tracing_subscriber::FmtSubscriber;
//! use wire_http::connection::{ResponseWriter, default_headers};
//! use wire_http::handler::Handler;
//! use wire_http::protocol::{ParseError, Request, SendError};
//! use wire_http::server::Server;
//!
//! struct HelloWorld;
//!
//! #[async_trait]
//! impl Handler for HelloWorld {
//!     type Error = SendError;
//!
//!     async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Result<Request, ParseError>) -> Result<(), SendError>
//!     where
//!         W: AsyncWrite + Unpin + Send,
//!     {
//!         let (status, body) = match request {
//!             Ok(_) => (StatusCode::OK, "Hello World!\r\n"),
//!             Err(_) => (StatusCode::BAD_REQUEST, "Bad Request\r\n"),
//!         };
//!         writer.write_status_line(status).await?;
//!         writer.write_headers(&default_headers(body.len())).await?;
//!         writer.write_body(body.as_bytes()).await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let mut server = Server::serve(8080, HelloWorld).await.expect("bind server error");
//!     tokio::signal::ctrl_c().await.expect("can't listen for ctrl-c");
//!     server.close().await;
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request, header and error types
//! - [`codec`]: the request decoder and the response encoders
//! - [`connection`]: reading a request and writing a response on one connection
//! - [`handler`]: the trait applications implement
//! - [`server`]: the TCP listener
//!
//! # Limitations
//!
//! - HTTP/1.1 only, one request per connection
//! - request bodies are framed by `content-length` only
//! - only the 200, 400 and 500 status codes can be written

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
