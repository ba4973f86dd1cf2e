//! The HTTP/1.x message model.
//!
//! - [`Message`] is the entity shared by requests and responses, the variant
//!   specific parts live in [`RequestLine`] and [`StatusLine`]
//! - [`FieldMap`] stores headers and cookies with case-insensitive keys
//! - [`ContentBuffer`] owns a message body and keeps a trailing zero byte
//! - [`PayloadSize`] and [`PayloadItem`] describe body framing for the decoders
//! - [`error`] holds every error type of the crate

mod content;
mod error;
mod field_map;
mod message;
mod payload;
mod request;
mod response;

pub use content::{ContentBuffer, TERMINATOR};
pub use error::{ConfigError, HttpError, ParseError, ReceiveError, SendError};
pub use field_map::FieldMap;
pub use message::{DataStatus, Message, MessageKind, STRING_HTTP_VERSION};
pub use payload::{PayloadItem, PayloadSize};
pub use request::RequestLine;
pub use response::StatusLine;

pub(crate) use request::{append_cookie_header, parse_cookie_header};
pub(crate) use response::append_set_cookie_headers;
