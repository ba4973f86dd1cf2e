//! Body framing: decoders for received payloads and the chunk encoder used
//! when sending.
//!
//! - [`PayloadDecoder`] dispatches to a length, chunked or until-EOF decoder
//! - [`ChunkedEncoder`] produces chunk heads, tails and the last chunk

mod chunked_decoder;
mod chunked_encoder;
mod eof_decoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_encoder::{ChunkFrame, ChunkedEncoder, LAST_CHUNK};
pub use payload_decoder::PayloadDecoder;
