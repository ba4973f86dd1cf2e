//! Connection handling: the transport, the receive engine and sending.
//!
//! - [`Connection`] wraps a read half and a write half, remembers the
//!   [`Lifecycle`] of the last exchange and bookmarks pipelined bytes
//! - [`Message::receive`](crate::protocol::Message::receive) and
//!   [`Message::read_from`](crate::protocol::Message::read_from) drive a
//!   parser until a message is complete
//! - [`Message::send`](crate::protocol::Message::send) writes a whole message
//! - [`Writer`] sends buffered content in one piece or as chunks
//!
//! Each connection serves one operation at a time. A [`CloseHandle`] lets
//! another task abort the operation in progress.

mod http_connection;
mod receive;
mod send;
mod writer;

#[cfg(test)]
mod mock;

pub use http_connection::{CloseHandle, Connection, DEFAULT_READ_BUFFER_SIZE, Lifecycle};
pub use writer::{FinishedHandler, Writer};
