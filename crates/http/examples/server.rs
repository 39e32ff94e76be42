use std::env;

use async_trait::async_trait;
use http::StatusCode;
use tokio::io::AsyncWrite;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use wire_http::connection::{ResponseWriter, default_headers};
use wire_http::handler::Handler;
use wire_http::protocol::{Headers, ParseError, Request, SendError};
use wire_http::server::Server;

const DEFAULT_PORT: u16 = 42069;
const DEFAULT_VIDEO_PATH: &str = "./assets/vim.mp4";

struct Demo {
    video_path: String,
}

#[async_trait]
impl Handler for Demo {
    type Error = SendError;

    async fn call<W>(&self, writer: &mut ResponseWriter<W>, request: Result<Request, ParseError>) -> Result<(), Self::Error>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let request = match request {
            Ok(request) => request,
            Err(_) => return bad_request(writer).await,
        };

        let target = request.target().unwrap_or_default().trim_matches('/');
        let mut segments = target.split('/');
        match segments.next().unwrap_or_default() {
            "yourproblem" => bad_request(writer).await,
            "myproblem" => internal_error(writer).await,
            "video" => self.video(writer).await,
            "stream" => match segments.next().map(str::parse::<usize>) {
                Some(Ok(frames)) => stream(writer, frames).await,
                _ => bad_request(writer).await,
            },
            _ => page(writer, StatusCode::OK, "Success!", "Your request was an absolute banger.").await,
        }
    }
}

impl Demo {
    async fn video<W>(&self, writer: &mut ResponseWriter<W>) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let video = match tokio::fs::read(&self.video_path).await {
            Ok(video) => video,
            Err(e) => {
                warn!(cause = %e, path = %self.video_path, "can't read video");
                return internal_error(writer).await;
            }
        };

        let mut headers = default_headers(video.len());
        headers.insert("content-type", "video/mp4");
        writer.write_status_line(StatusCode::OK).await?;
        writer.write_headers(&headers).await?;
        writer.write_body(&video).await?;
        Ok(())
    }
}

/// Streams `frames` numbered lines as chunks and reports the byte count in a trailer.
async fn stream<W>(writer: &mut ResponseWriter<W>, frames: usize) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut headers = Headers::new();
    headers.insert("connection", "close");
    headers.insert("content-type", mime::TEXT_PLAIN_UTF_8.as_ref());
    headers.insert("transfer-encoding", "chunked");
    headers.insert("trailer", "X-Content-Length");

    writer.write_status_line(StatusCode::OK).await?;
    writer.write_headers(&headers).await?;

    let mut sent = 0;
    for frame in 0..frames {
        sent += writer.write_chunked_body(format!("frame {frame}\n").as_bytes()).await?;
    }
    writer.write_chunked_body_done().await?;

    let mut trailers = Headers::new();
    trailers.insert("X-Content-Length", sent.to_string());
    writer.write_trailers(&trailers).await
}

async fn bad_request<W>(writer: &mut ResponseWriter<W>) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin + Send,
{
    page(writer, StatusCode::BAD_REQUEST, "Bad Request", "Your request honestly kinda sucked.").await
}

async fn internal_error<W>(writer: &mut ResponseWriter<W>) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin + Send,
{
    page(writer, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", "Okay, you know what? This one is on me.").await
}

async fn page<W>(writer: &mut ResponseWriter<W>, status: StatusCode, heading: &str, message: &str) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin + Send,
{
    let title = format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or_default());
    let html = format!("<html>\n  <head>\n    <title>{title}</title>\n  </head>\n  <body>\n    <h1>{heading}</h1>\n    <p>{message}</p>\n  </body>\n</html>\n");

    let mut headers = default_headers(html.len());
    headers.insert("content-type", mime::TEXT_HTML_UTF_8.as_ref());
    writer.write_status_line(status).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(html.as_bytes()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let port = match env::var("PORT").map(|port| port.parse::<u16>()) {
        Ok(Ok(port)) => port,
        Ok(Err(e)) => {
            error!(cause = %e, "invalid PORT");
            return;
        }
        Err(_) => DEFAULT_PORT,
    };
    let video_path = env::var("VIDEO_PATH").unwrap_or_else(|_| DEFAULT_VIDEO_PATH.to_string());

    let mut server = match Server::serve(port, Demo { video_path }).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "can't listen for shutdown signal");
    }
    server.close().await;
    info!("server gracefully stopped");
}
