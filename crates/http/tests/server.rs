use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Decoder;
use wire_http::codec::ChunkedDecoder;
use wire_http::connection::{ResponseWriter, default_headers};
use wire_http::handler::Handler;
use wire_http::protocol::{Headers, ParseError, PayloadItem, Request, SendError, ServerError};
use wire_http::server::Server;

struct Routes;

#[async_trait]
impl Handler for Routes {
    type Error = SendError;

    async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Result<Request, ParseError>) -> Result<(), Self::Error>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let request = match request {
            Ok(request) => request,
            Err(e) => return plain(writer, StatusCode::BAD_REQUEST, &e.to_string()).await,
        };

        match request.target().unwrap_or_default() {
            "/chunked" => {
                let mut headers = Headers::new();
                headers.insert("transfer-encoding", "chunked");
                headers.insert("trailer", "X-Content-Length");
                headers.insert("connection", "close");

                writer.write_status_line(StatusCode::OK).await?;
                writer.write_headers(&headers).await?;
                let mut sent = 0;
                for chunk in [&b"hello "[..], &b"chunked "[..], &b"world"[..]] {
                    sent += writer.write_chunked_body(chunk).await?;
                }
                writer.write_chunked_body_done().await?;

                let mut trailers = Headers::new();
                trailers.insert("X-Content-Length", sent.to_string());
                writer.write_trailers(&trailers).await
            }
            "/echo" => {
                let body = String::from_utf8_lossy(request.body()).into_owned();
                plain(writer, StatusCode::OK, &body).await
            }
            "/fail" => plain(writer, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").await,
            target => plain(writer, StatusCode::OK, target).await,
        }
    }
}

async fn plain<W>(writer: &mut ResponseWriter<W>, status: StatusCode, body: &str) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin + Send,
{
    writer.write_status_line(status).await?;
    writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(body.as_bytes()).await?;
    Ok(())
}

struct Response {
    status_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

async fn send(server: &Server, request: &[u8]) -> Response {
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream.write_all(request).await.unwrap();
    read_response(stream).await
}

async fn read_response(mut stream: TcpStream) -> Response {
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let head_end = raw.windows(4).position(|window| window == b"\r\n\r\n").unwrap();
    let head = std::str::from_utf8(&raw[..head_end]).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap().to_string();
    let headers = lines
        .map(|line| {
            let (name, value) = line.split_once(": ").unwrap();
            (name.to_string(), value.to_string())
        })
        .collect();

    Response { status_line, headers, body: raw[head_end + 4..].to_vec() }
}

#[tokio::test]
async fn serves_concurrent_clients() {
    let mut server = Server::serve(0, Routes).await.unwrap();

    let clients: Vec<_> = (0..16)
        .map(|i| {
            let addr = server.local_addr();
            tokio::spawn(async move {
                let mut stream = TcpStream::connect(addr).await.unwrap();
                let request = format!("GET /client/{i} HTTP/1.1\r\nHost: localhost\r\n\r\n");
                // split the request so the server sees it over several reads
                let (first, second) = request.as_bytes().split_at(request.len() / 2);
                stream.write_all(first).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
                stream.write_all(second).await.unwrap();
                (i, read_response(stream).await)
            })
        })
        .collect();

    for client in clients {
        let (i, response) = client.await.unwrap();
        let expected = format!("/client/{i}");
        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.header("content-length"), Some(expected.len().to_string().as_str()));
        assert_eq!(response.header("connection"), Some("close"));
        assert_eq!(response.body, format!("{expected}\r\n").into_bytes());
    }

    server.close().await;
}

#[tokio::test]
async fn request_body_by_content_length() {
    let mut server = Server::serve(0, Routes).await.unwrap();

    let response = send(&server, b"POST /echo HTTP/1.1\r\nContent-Length: 13\r\n\r\nhello world!\n").await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.body, b"hello world!\n\r\n");

    server.close().await;
}

#[tokio::test]
async fn malformed_request_gets_handler_response() {
    let mut server = Server::serve(0, Routes).await.unwrap();

    // nothing follows the malformed line, so the server reads every byte sent before closing
    let response = send(&server, b"GET /coffee HTTP/6.9\r\n").await;
    assert_eq!(response.status_line, "HTTP/1.1 400 Bad Request");

    let response = send(&server, b"GET / HTTP/1.1\r\nHost localhost\r\n").await;
    assert_eq!(response.status_line, "HTTP/1.1 400 Bad Request");
    assert!(String::from_utf8_lossy(&response.body).starts_with("invalid header"));

    server.close().await;
}

#[tokio::test]
async fn internal_server_error() {
    let mut server = Server::serve(0, Routes).await.unwrap();

    let response = send(&server, b"GET /fail HTTP/1.1\r\n\r\n").await;
    assert_eq!(response.status_line, "HTTP/1.1 500 Internal Server Error");

    server.close().await;
}

#[tokio::test]
async fn chunked_response_with_trailers() {
    let mut server = Server::serve(0, Routes).await.unwrap();

    let response = send(&server, b"GET /chunked HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.header("transfer-encoding"), Some("chunked"));
    assert_eq!(response.header("trailer"), Some("X-Content-Length"));
    assert_eq!(response.header("content-length"), None);

    let mut buffer = BytesMut::from(&response.body[..]);
    let mut decoder = ChunkedDecoder::new();
    let mut body = Vec::new();
    loop {
        match decoder.decode_eof(&mut buffer).unwrap() {
            Some(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
            Some(PayloadItem::Eof) => break,
            None => panic!("chunked body ended early"),
        }
    }

    assert_eq!(body, b"hello chunked world");
    assert_eq!(decoder.trailers().get("x-content-length"), Some("19"));
    // the closing CRLF written when the connection ends
    assert_eq!(&buffer[..], b"\r\n");

    server.close().await;
}

#[tokio::test]
async fn close_keeps_accepted_connections_alive() {
    let mut server = Server::serve(0, Routes).await.unwrap();
    let addr = server.local_addr();

    let mut open = TcpStream::connect(addr).await.unwrap();
    open.write_all(b"GET /late HTTP/1.1\r\n").await.unwrap();
    // give the accept loop time to pick the connection up
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.close().await;
    assert!(!server.is_running());
    assert!(TcpStream::connect(addr).await.is_err());

    open.write_all(b"Host: localhost\r\n\r\n").await.unwrap();
    let response = read_response(open).await;
    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.body, b"/late\r\n");

    // closing twice is fine
    server.close().await;
}

#[tokio::test]
async fn bind_error() {
    let mut server = Server::serve(0, Routes).await.unwrap();
    let port = server.local_addr().port();

    let result = Server::serve(port, Routes).await;
    assert!(matches!(result, Err(ServerError::Bind { port: p, .. }) if p == port));

    server.close().await;
}
