//! HTTP/1.x messages with incremental receive and zero-copy biased send.
//!
//! This crate provides the message model of HTTP/1.x together with the
//! asynchronous machinery to move messages over a tokio transport:
//!
//! - parse-as-you-read reception with pipelining support
//! - connection lifecycle inference (keep-alive, pipelined, close)
//! - plain and chunked transmission from copied, moved or borrowed buffers,
//!   with one vectored write per send
//!
//! # Example
//!
//! ```no_run
//! use micro_h1::codec::HttpParser;
//! use micro_h1::connection::{Connection, Writer};
//! use micro_h1::protocol::Message;
//! use tokio::net::TcpListener;
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (stream, remote_addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let mut connection = Connection::new(reader, writer).with_remote_addr(remote_addr);
//!             let mut parser = HttpParser::request();
//!             let mut request = Message::request();
//!
//!             while connection.is_open() {
//!                 if let Err(e) = request.receive(&mut connection, &mut parser).await {
//!                     info!(cause = %e, "stop receiving");
//!                     break;
//!                 }
//!
//!                 let mut writer = Writer::response(&mut connection, &request);
//!                 writer.write_text("Hello World!\r\n");
//!                 if let Err(e) = writer.send().await {
//!                     error!(cause = %e, "send failed");
//!                     break;
//!                 }
//!                 drop(writer);
//!
//!                 if connection.finish().await.is_err() {
//!                     break;
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: [`Message`](protocol::Message), header and cookie stores,
//!   content buffers and the error types
//! - [`codec`]: the incremental parser and the head and chunk codecs
//! - [`connection`]: the transport wrapper, the receive engine and the
//!   [`Writer`](connection::Writer)
//!
//! # Error Handling
//!
//! - [`protocol::ReceiveError`]: a [`protocol::ParseError`] with the number
//!   of bytes consumed; a stream closed inside a message is an `Io` error of
//!   kind `UnexpectedEof`
//! - [`protocol::SendError`]: failed writes and sends on closed connections
//! - [`protocol::ConfigError`]: invalid parser options
//! - [`protocol::HttpError`]: all of the above

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
