//! Chunk framing for `Transfer-Encoding: chunked` bodies.
//!
//! Only the framing goes through the encoder. Chunk data stays in the caller's
//! buffers and is placed between the frame head and the frame tail of a
//! vectored write.

use std::fmt::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::SendError;

/// The zero length chunk and the empty trailer section.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

const CRLF: &[u8] = b"\r\n";

/// One piece of chunk framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFrame {
    /// `<hex-size>\r\n`, written before `size` data bytes.
    Head(usize),
    /// `\r\n` after the data of a chunk.
    Tail,
    /// The terminating [`LAST_CHUNK`].
    Last,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl Encoder<ChunkFrame> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, frame: ChunkFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match frame {
            // a zero size head would end the stream
            ChunkFrame::Head(0) => {}
            ChunkFrame::Head(size) => {
                write!(dst, "{size:X}").map_err(|_| SendError::io(std::io::ErrorKind::OutOfMemory))?;
                dst.put_slice(CRLF);
            }
            ChunkFrame::Tail => dst.put_slice(CRLF),
            ChunkFrame::Last => {
                self.eof = true;
                dst.put_slice(LAST_CHUNK);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_a_chunk_in_hex() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(ChunkFrame::Head(255), &mut dst).unwrap();
        dst.put_slice(b"...");
        encoder.encode(ChunkFrame::Tail, &mut dst).unwrap();

        assert_eq!(&dst[..], b"FF\r\n...\r\n");
    }

    #[test]
    fn nothing_after_last_chunk() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(ChunkFrame::Head(0), &mut dst).unwrap();
        encoder.encode(ChunkFrame::Last, &mut dst).unwrap();
        encoder.encode(ChunkFrame::Head(3), &mut dst).unwrap();

        assert!(encoder.is_eof());
        assert_eq!(&dst[..], LAST_CHUNK);
    }
}
