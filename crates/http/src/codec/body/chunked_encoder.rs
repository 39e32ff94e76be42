use bytes::{Buf, BufMut, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::protocol::{PayloadItem, SendError};

/// Encodes payload items as chunked transfer coding frames.
///
/// Each [`PayloadItem::Chunk`] becomes `HEX-SIZE\r\n<data>\r\n`, [`PayloadItem::Eof`] becomes
/// the terminator `0\r\n`. The blank line closing the message is left to whoever writes the
/// trailers, so trailer fields can still follow the terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminator has been written.
    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Payload bytes framed so far, excluding the framing itself.
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload_item after the chunked terminator");
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                // an empty frame would read as the terminator
                if !bytes.has_remaining() {
                    return Ok(());
                }
                let size = bytes.remaining();
                write!(helper::Writer(dst), "{size:X}\r\n")?;
                dst.reserve(size + 2);
                dst.put(bytes);
                dst.extend_from_slice(b"\r\n");
                self.send_size += size;
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
