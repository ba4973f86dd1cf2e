//! Buffered message transmission with mixed ownership content.
//!
//! A [`Writer`] collects the content of one outgoing message from several
//! sources and sends it, in one piece or as a series of chunks. Every send
//! issues a single vectored write made of the serialized head, the collected
//! content and the chunk framing.
//!
//! Content can be added four ways:
//!
//! | method                                   | storage                     |
//! |------------------------------------------|-----------------------------|
//! | [`write_text`](Writer::write_text), `write!` | copied into a text buffer |
//! | [`write_bytes`](Writer::write_bytes)     | copied                      |
//! | [`write_no_copy`](Writer::write_no_copy) | borrowed for `'data`        |
//! | [`write_move`](Writer::write_move)       | ownership moved in          |
//!
//! Borrowed content must outlive the writer, which the `'data` lifetime
//! enforces.

use std::fmt;
use std::io::IoSlice;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Encoder;
use tracing::{debug, warn};

use crate::codec::{ChunkFrame, ChunkedEncoder};
use crate::connection::{Connection, Lifecycle};
use crate::protocol::{Message, SendError};

/// One piece of pending content.
#[derive(Debug, Clone)]
enum ContentPart<'data> {
    /// Copied from the caller.
    Copied(Bytes),
    /// Handed over by the caller.
    Moved(Bytes),
    /// Owned by the caller.
    Borrowed(&'data [u8]),
}

impl ContentPart<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            ContentPart::Copied(bytes) | ContentPart::Moved(bytes) => bytes,
            ContentPart::Borrowed(slice) => slice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendMode {
    Whole,
    Chunk,
    FinalChunk,
}

/// Called with the outcome of the last send of a [`Writer`].
pub type FinishedHandler<'conn> = Box<dyn FnOnce(&Result<usize, SendError>) + Send + 'conn>;

pub struct Writer<'conn, 'data, R, W> {
    connection: &'conn mut Connection<R, W>,
    message: Message,
    parts: Vec<ContentPart<'data>>,
    text: String,
    supports_chunks: bool,
    sending_chunks: bool,
    sent_headers: bool,
    encoder: ChunkedEncoder,
    finished: Option<FinishedHandler<'conn>>,
}

impl<R, W> fmt::Debug for Writer<'_, '_, R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("first_line", &self.message.first_line())
            .field("parts", &self.parts.len())
            .field("content_length", &self.content_length())
            .field("supports_chunks", &self.supports_chunks)
            .field("sending_chunks", &self.sending_chunks)
            .field("sent_headers", &self.sent_headers)
            .finish_non_exhaustive()
    }
}

impl<'conn, 'data, R, W> Writer<'conn, 'data, R, W> {
    /// A writer for the response to `request`.
    ///
    /// The response takes the request's version, and chunks are only used
    /// if the request's sender understands them.
    pub fn response(connection: &'conn mut Connection<R, W>, request: &Message) -> Self {
        let supports_chunks = request.chunks_supported();
        Self::new(connection, Message::response_for(request), supports_chunks)
    }

    /// A writer sending `message`, usually a request, with chunk support.
    pub fn request(connection: &'conn mut Connection<R, W>, message: Message) -> Self {
        Self::new(connection, message, true)
    }

    fn new(connection: &'conn mut Connection<R, W>, message: Message, supports_chunks: bool) -> Self {
        Self {
            connection,
            message,
            parts: Vec::new(),
            text: String::new(),
            supports_chunks,
            sending_chunks: false,
            sent_headers: false,
            encoder: ChunkedEncoder::new(),
            finished: None,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    /// Sets the handler run once, after [`send`](Writer::send) or
    /// [`send_final_chunk`](Writer::send_final_chunk) completes.
    pub fn set_finished_handler<F>(&mut self, handler: F)
    where
        F: FnOnce(&Result<usize, SendError>) + Send + 'conn,
    {
        self.finished = Some(Box::new(handler));
    }

    pub fn supports_chunks(&self) -> bool {
        self.supports_chunks
    }

    pub fn set_supports_chunks(&mut self, supports_chunks: bool) {
        self.supports_chunks = supports_chunks;
    }

    pub fn sending_chunks(&self) -> bool {
        self.sending_chunks
    }

    pub fn sent_headers(&self) -> bool {
        self.sent_headers
    }

    /// Bytes waiting for the next send.
    pub fn content_length(&self) -> usize {
        self.parts.iter().map(|part| part.as_slice().len()).sum::<usize>() + self.text.len()
    }

    /// Appends text to the pending text buffer.
    pub fn write_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.flush_text();
        if !bytes.is_empty() {
            self.parts.push(ContentPart::Copied(Bytes::copy_from_slice(bytes)));
        }
    }

    /// Appends caller owned bytes without copying them.
    pub fn write_no_copy(&mut self, bytes: &'data [u8]) {
        self.flush_text();
        if !bytes.is_empty() {
            self.parts.push(ContentPart::Borrowed(bytes));
        }
    }

    pub fn write_str_no_copy(&mut self, text: &'data str) {
        self.write_no_copy(text.as_bytes());
    }

    /// Takes ownership of `content`, e.g. a `String` or `Vec<u8>`, without copying it.
    pub fn write_move<B: Into<Bytes>>(&mut self, content: B) {
        self.flush_text();
        let bytes = content.into();
        if !bytes.is_empty() {
            self.parts.push(ContentPart::Moved(bytes));
        }
    }

    /// Drops all pending content. Call it between chunks.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.text.clear();
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.parts.push(ContentPart::Copied(Bytes::from(text)));
        }
    }

    fn notify_finished(&mut self, result: &Result<usize, SendError>) {
        if let Some(handler) = self.finished.take() {
            handler(result);
        }
    }
}

impl<R, W> Writer<'_, '_, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Sends the head and all pending content with a `Content-Length`.
    pub async fn send(&mut self) -> Result<usize, SendError> {
        let result = self.transmit(SendMode::Whole).await;
        self.notify_finished(&result);
        result
    }

    /// Sends the pending content as one chunk, preceded by the head on the
    /// first call.
    ///
    /// Without chunk support on the other side the content goes out
    /// unframed and the connection is closed after the exchange.
    pub async fn send_chunk(&mut self) -> Result<usize, SendError> {
        self.transmit(SendMode::Chunk).await
    }

    /// Like [`send_chunk`](Writer::send_chunk), then ends the chunked body.
    pub async fn send_final_chunk(&mut self) -> Result<usize, SendError> {
        let result = self.transmit(SendMode::FinalChunk).await;
        self.notify_finished(&result);
        result
    }

    async fn transmit(&mut self, mode: SendMode) -> Result<usize, SendError> {
        if !self.connection.is_open() {
            warn!(?mode, "send on a closed connection");
            return Err(SendError::ConnectionReset);
        }

        self.flush_text();
        let content_length = self.content_length();
        let chunked = mode != SendMode::Whole;

        if chunked {
            self.sending_chunks = true;
            if !self.supports_chunks {
                self.connection.set_lifecycle(Lifecycle::Close);
            }
        }

        let mut head = BytesMut::new();
        if !chunked || !self.sent_headers {
            self.message.set_chunks_supported(self.supports_chunks);
            self.message.set_content_length(content_length);
            self.message.prepare_buffers_for_send(&mut head, self.connection.keep_alive(), chunked);
            self.sent_headers = true;
        }

        let mut tail = BytesMut::new();
        if chunked && self.supports_chunks {
            self.encoder.encode(ChunkFrame::Head(content_length), &mut head)?;
            if content_length > 0 {
                self.encoder.encode(ChunkFrame::Tail, &mut tail)?;
            }
            if mode == SendMode::FinalChunk {
                self.encoder.encode(ChunkFrame::Last, &mut tail)?;
            }
        }

        let mut bufs = Vec::with_capacity(self.parts.len() + 2);
        bufs.push(IoSlice::new(&head));
        bufs.extend(self.parts.iter().map(|part| IoSlice::new(part.as_slice())));
        bufs.push(IoSlice::new(&tail));

        let written = self.connection.write(&mut bufs).await?;
        debug!(?mode, written, content_length, "writer sent");
        Ok(written)
    }
}

impl<R, W> fmt::Write for Writer<'_, '_, R, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_text(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{HttpParser, MessageParser};
    use std::fmt::Write as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn keep_alive_connection() -> Connection<tokio::io::Empty, Vec<u8>> {
        let mut connection = Connection::new(tokio::io::empty(), Vec::new());
        connection.set_lifecycle(Lifecycle::KeepAlive);
        connection
    }

    fn http11_request() -> Message {
        let mut request = Message::request();
        request.set_chunks_supported(true);
        request
    }

    fn parse_response(wire: &[u8]) -> Message {
        let mut parser = HttpParser::response();
        let mut response = Message::response();
        parser.set_read_buffer(wire);
        assert!(parser.parse(&mut response).is_done());
        assert!(parser.eof());
        response
    }

    #[tokio::test]
    async fn mixed_parts_keep_their_order() {
        let mut connection = keep_alive_connection();
        let borrowed = String::from("borrowed ");
        let request = http11_request();

        let mut writer = Writer::response(&mut connection, &request);
        write!(writer, "{} ", 42).unwrap();
        writer.write_bytes(b"copied ");
        writer.write_str_no_copy(&borrowed);
        writer.write_text("text ");
        writer.write_move(String::from("moved"));
        assert_eq!(writer.content_length(), 29);

        let written = writer.send().await.unwrap();
        drop(writer);

        let wire = connection.writer();
        assert_eq!(written, wire.len());
        let response = parse_response(wire);
        assert_eq!(response.content(), b"42 copied borrowed text moved");
        assert_eq!(response.header("connection"), "Keep-Alive");
    }

    #[tokio::test]
    async fn chunked_content_reassembles() {
        let mut connection = keep_alive_connection();
        let request = http11_request();
        let pieces: [&[u8]; 3] = [b"first chunk, ", b"second, ", b"and the last one"];

        let mut writer = Writer::response(&mut connection, &request);
        for piece in &pieces[..2] {
            writer.write_bytes(piece);
            writer.send_chunk().await.unwrap();
            writer.clear();
        }
        writer.write_bytes(pieces[2]);
        writer.send_final_chunk().await.unwrap();
        assert!(writer.sending_chunks());
        drop(writer);

        let response = parse_response(connection.writer());
        assert!(response.is_chunked());
        assert_eq!(response.content(), pieces.concat());
        assert!(!response.has_header("content-length"));
    }

    #[tokio::test]
    async fn head_is_sent_once_when_chunking() {
        let mut connection = keep_alive_connection();
        let request = http11_request();

        let mut writer = Writer::response(&mut connection, &request);
        writer.send_chunk().await.unwrap();
        writer.write_text("only");
        writer.send_final_chunk().await.unwrap();
        drop(writer);

        let wire = std::str::from_utf8(connection.writer()).unwrap();
        assert_eq!(wire.matches("HTTP/1.1 200 OK").count(), 1);
        assert!(wire.ends_with("\r\n\r\n4\r\nonly\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn chunks_without_peer_support_close_the_connection() {
        let mut connection = keep_alive_connection();
        let mut request = Message::request();
        request.set_version_minor(0);

        let mut writer = Writer::response(&mut connection, &request);
        writer.write_text("raw ");
        writer.send_chunk().await.unwrap();
        writer.clear();
        writer.write_text("body");
        writer.send_final_chunk().await.unwrap();
        drop(writer);

        assert_eq!(connection.lifecycle(), Lifecycle::Close);
        let wire = std::str::from_utf8(connection.writer()).unwrap();
        assert!(wire.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(wire.contains("connection: close\r\n"));
        assert!(!wire.contains("transfer-encoding"));
        assert!(wire.ends_with("\r\n\r\nraw body"));
    }

    #[tokio::test]
    async fn clear_drops_pending_content() {
        let mut connection = keep_alive_connection();
        let request = http11_request();

        let mut writer = Writer::response(&mut connection, &request);
        writer.write_bytes(b"stale");
        writer.write_text("stale text");
        writer.clear();
        assert_eq!(writer.content_length(), 0);

        writer.write_text("fresh");
        writer.send().await.unwrap();
        drop(writer);

        let response = parse_response(connection.writer());
        assert_eq!(response.content(), b"fresh");
        assert_eq!(response.content_length(), 5);
    }

    #[tokio::test]
    async fn finished_handler_runs_once() {
        let mut connection = keep_alive_connection();
        let request = http11_request();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut writer = Writer::response(&mut connection, &request);
        let counter = Arc::clone(&calls);
        writer.set_finished_handler(move |result| {
            assert!(matches!(result, Ok(n) if *n > 0));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        writer.write_text("a");
        writer.send_chunk().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        writer.send_final_chunk().await.unwrap();
        writer.send().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_connection_reports_reset_to_handler() {
        let mut connection = keep_alive_connection();
        connection.close();
        let request = http11_request();
        let reset = Arc::new(AtomicUsize::new(0));

        let mut writer = Writer::response(&mut connection, &request);
        let seen = Arc::clone(&reset);
        writer.set_finished_handler(move |result| {
            if matches!(result, Err(e) if e.is_connection_reset()) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        writer.write_text("never sent");

        assert!(matches!(writer.send().await, Err(SendError::ConnectionReset)));
        drop(writer);

        assert_eq!(reset.load(Ordering::SeqCst), 1);
        assert!(connection.writer().is_empty());
    }

    #[tokio::test]
    async fn close_handle_aborts_blocked_send() {
        let (client, server) = tokio::io::duplex(8);
        let (reader, writer_half) = tokio::io::split(server);
        let mut connection = Connection::new(reader, writer_half);
        connection.set_lifecycle(Lifecycle::KeepAlive);
        let handle = connection.close_handle();
        let request = http11_request();
        let aborted = Arc::new(AtomicUsize::new(0));

        let closer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.close();
        });

        let mut writer = Writer::response(&mut connection, &request);
        let seen = Arc::clone(&aborted);
        writer.set_finished_handler(move |result| {
            if matches!(result, Err(SendError::Io { source }) if source.kind() == std::io::ErrorKind::ConnectionAborted) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        writer.write_move(vec![b'x'; 1024]);

        let error = writer.send().await.unwrap_err();
        assert!(matches!(&error, SendError::Io { source } if source.kind() == std::io::ErrorKind::ConnectionAborted));
        assert!(error.is_connection_reset());
        drop(writer);

        assert_eq!(aborted.load(Ordering::SeqCst), 1);
        assert!(!connection.is_open());
        closer.await.unwrap();
        drop(client);
    }

    #[tokio::test]
    async fn request_writer_sends_chunked_request() {
        let mut connection = keep_alive_connection();
        let mut message = Message::request();
        message.request_line_mut().unwrap().set_method(http::Method::POST);
        message.add_header("Host", "localhost");

        let mut writer = Writer::request(&mut connection, message);
        writer.write_move(b"payload".to_vec());
        writer.send_final_chunk().await.unwrap();
        drop(writer);

        let mut parser = HttpParser::request();
        let mut parsed = Message::request();
        parser.set_read_buffer(connection.writer());
        assert!(parser.parse(&mut parsed).is_done());
        assert_eq!(parsed.request_line().unwrap().method(), &http::Method::POST);
        assert_eq!(parsed.header("transfer-encoding"), "chunked");
        assert_eq!(parsed.content(), b"payload");
    }
}
