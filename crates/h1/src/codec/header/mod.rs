//! Message heads: [`HeaderDecoder`] parses them with `httparse`,
//! [`HeaderEncoder`] serializes a [`Message`](crate::protocol::Message) head.

mod header_decoder;
mod header_encoder;

pub use header_decoder::{DEFAULT_MAX_HEADER_BYTES, Head, HeaderDecoder, MAX_HEADER_NUM};
pub(crate) use header_decoder::MIN_HEAD_LEN;
pub use header_encoder::HeaderEncoder;
