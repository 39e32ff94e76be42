use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// A raw request used as benchmark input.
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    content: &'static [u8],
}

impl Fixture {
    pub const fn new(name: &'static str, content: &'static [u8]) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    /// A byte source handing out the fixture `per_read` bytes at a time.
    pub fn source(&self, per_read: usize) -> SegmentedSource {
        SegmentedSource { content: self.content, per_read: per_read.max(1), pos: 0 }
    }
}

/// Serves a fixture in fixed-size segments, like a peer writing small packets.
#[derive(Debug)]
pub struct SegmentedSource {
    content: &'static [u8],
    per_read: usize,
    pos: usize,
}

impl AsyncRead for SegmentedSource {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.content[self.pos..];
        let amt = remaining.len().min(self.per_read).min(buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.pos += amt;
        Poll::Ready(Ok(()))
    }
}
