//! Body framing shared by the decoders and the parser.

use bytes::Bytes;

/// Output of a body decoder: a run of content bytes, or the end of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    Chunk(Bytes),
    Eof,
}

impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, Self::Chunk(_))
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        if let Self::Chunk(bytes) = self { Some(bytes) } else { None }
    }
}

/// How the end of a message body is found.
///
/// Chosen once per message from its head, see
/// [`HttpParser`](crate::codec::HttpParser).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// `Content-Length` bytes follow the head.
    Length(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// A response body without framing, ended by the peer closing the stream.
    UntilEof,
    /// No body at all.
    Empty,
}
