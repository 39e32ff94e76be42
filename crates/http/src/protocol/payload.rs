use bytes::{Buf, Bytes};

/// One item of a chunked payload stream.
///
/// The [`ChunkedEncoder`](crate::codec::ChunkedEncoder) turns a `Chunk` into a single frame and
/// `Eof` into the zero-length terminator; the [`ChunkedDecoder`](crate::codec::ChunkedDecoder)
/// yields them back in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A frame of payload data
    Chunk(Data),
    /// The zero-length frame ending the payload
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns the frame data, `None` for the terminator.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}
