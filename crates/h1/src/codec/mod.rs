//! Wire codecs for HTTP/1.x messages.
//!
//! - [`HttpParser`] implements [`MessageParser`], the incremental parser used
//!   by the receive engine. It reports [`ParseStatus::Done`],
//!   [`ParseStatus::Failed`] or [`ParseStatus::NeedMore`] for every batch of
//!   input.
//! - The [`header`] codecs turn message heads into bytes and back.
//! - The [`body`] codecs frame payloads by length, by chunks or by the end of
//!   the stream.
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::{HttpParser, MessageParser};
//! use micro_h1::protocol::Message;
//!
//! let mut parser = HttpParser::request();
//! let mut message = Message::request();
//!
//! parser.set_read_buffer(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! assert!(parser.parse(&mut message).is_done());
//! assert_eq!(message.header("host"), "localhost");
//! ```

pub mod body;
pub mod header;
mod parser;

pub use body::{ChunkFrame, ChunkedEncoder, LAST_CHUNK, PayloadDecoder};
pub use header::{DEFAULT_MAX_HEADER_BYTES, Head, HeaderDecoder, HeaderEncoder, MAX_HEADER_NUM};
pub use parser::{DEFAULT_MAX_CONTENT_LENGTH, HttpParser, MessageParser, ParseStatus, ParserOptions};
