//! Body decoding for messages delimited by the peer closing the connection.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{ParseError, PayloadItem};

/// Hands out every byte it sees. Only [`Decoder::decode_eof`] ends the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EofDecoder {
    finished: bool,
}

impl Decoder for EofDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.finished {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        Ok(Some(PayloadItem::Chunk(src.split().freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            self.finished = true;
            return Ok(Some(PayloadItem::Eof));
        }
        self.decode(src)
    }
}
