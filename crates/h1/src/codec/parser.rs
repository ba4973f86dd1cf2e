//! Incremental HTTP/1.x message parser.
//!
//! [`HttpParser`] is fed with whatever bytes the transport produced and
//! reports one of three outcomes through [`ParseStatus`]. It decodes the head
//! with [`HeaderDecoder`], then the body with a [`PayloadDecoder`] selected
//! from the head. Bytes past the end of the message stay in the parser and
//! can be taken back with [`MessageParser::load_read_pos`] for the next
//! pipelined message.

use bytes::{Bytes, BytesMut};
use http::{StatusCode, header};
use tokio_util::codec::Decoder;
use tracing::{error, trace, warn};

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{DEFAULT_MAX_HEADER_BYTES, Head, HeaderDecoder, MIN_HEAD_LEN};
use crate::protocol::{
    ConfigError, DataStatus, FieldMap, Message, MessageKind, ParseError, PayloadItem, PayloadSize, parse_cookie_header,
};
use crate::utils::ensure;

/// Default limit for a message body.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1024 * 1024;

/// Outcome of feeding bytes to a [`MessageParser`].
#[derive(Debug)]
pub enum ParseStatus {
    /// The message is complete.
    Done,
    /// The message is malformed; it must be discarded.
    Failed(ParseError),
    /// More bytes are needed to decide.
    NeedMore,
}

impl ParseStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, ParseStatus::Done)
    }

    pub fn is_need_more(&self) -> bool {
        matches!(self, ParseStatus::NeedMore)
    }
}

/// The parser side of a receive.
pub trait MessageParser {
    /// Appends freshly read bytes to the parser's input.
    fn set_read_buffer(&mut self, bytes: &[u8]);

    /// Parses as much of the buffered input as possible into `message`.
    fn parse(&mut self, message: &mut Message) -> ParseStatus;

    /// Called when the stream ended before [`ParseStatus::Done`].
    ///
    /// Returns `false` when the end of the stream legitimately ends the
    /// message; `message` is then complete.
    fn check_premature_eof(&mut self, message: &mut Message) -> bool;

    /// Bytes consumed since the last [`reset`](MessageParser::reset).
    fn total_bytes_read(&self) -> usize;

    /// Takes the buffered bytes that follow the parsed message.
    fn load_read_pos(&mut self) -> BytesMut;

    /// Whether the parsed message used up every buffered byte.
    fn eof(&self) -> bool;

    fn parse_headers_only(&mut self, headers_only: bool);

    fn is_headers_only(&self) -> bool;

    fn set_max_content_length(&mut self, max_content_length: usize);

    /// Prepares the parser for a new message, dropping any buffered input.
    fn reset(&mut self);
}

/// Limits and modes of an [`HttpParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    headers_only: bool,
    max_content_length: usize,
    max_header_bytes: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            headers_only: false,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after the head, leaving the body bytes unread.
    pub fn headers_only(mut self, headers_only: bool) -> Self {
        self.headers_only = headers_only;
        self
    }

    pub fn max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }

    pub fn max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.max_header_bytes >= MIN_HEAD_LEN,
            ConfigError::invalid_option("max_header_bytes", format!("must be at least {MIN_HEAD_LEN}"))
        );
        ensure!(
            self.max_content_length <= isize::MAX as usize,
            ConfigError::invalid_option("max_content_length", "must not exceed isize::MAX")
        );
        Ok(())
    }
}

#[derive(Debug)]
enum State {
    Head,
    Body(PayloadDecoder),
    Finished,
}

#[derive(Debug)]
pub struct HttpParser {
    options: ParserOptions,
    header_decoder: HeaderDecoder,
    buf: BytesMut,
    state: State,
    consumed: usize,
    body_pos: usize,
    size: PayloadSize,
}

impl HttpParser {
    /// A parser for requests with default options.
    pub fn request() -> Self {
        Self::new(true, ParserOptions::default())
    }

    /// A parser for responses with default options.
    pub fn response() -> Self {
        Self::new(false, ParserOptions::default())
    }

    pub fn with_options(is_request: bool, options: ParserOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self::new(is_request, options))
    }

    fn new(is_request: bool, options: ParserOptions) -> Self {
        Self {
            options,
            header_decoder: HeaderDecoder::new(is_request, options.max_header_bytes),
            buf: BytesMut::new(),
            state: State::Head,
            consumed: 0,
            body_pos: 0,
            size: PayloadSize::Empty,
        }
    }

    pub fn is_request(&self) -> bool {
        self.header_decoder.is_request()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    fn decode_step(&mut self, message: &mut Message) -> Result<bool, ParseError> {
        loop {
            match &mut self.state {
                State::Head => {
                    let before = self.buf.len();
                    let Some(head) = self.header_decoder.decode(&mut self.buf)? else {
                        return Ok(false);
                    };
                    self.consumed += before - self.buf.len();

                    let size = self.apply_head(head, message)?;
                    self.size = size;
                    if self.options.headers_only {
                        trace!(?size, "stopping after headers");
                        self.complete(message, false);
                        return Ok(true);
                    }
                    self.state = State::Body(PayloadDecoder::from(size));
                }
                State::Body(decoder) => {
                    let before = self.buf.len();
                    let item = decoder.decode(&mut self.buf)?;
                    self.consumed += before - self.buf.len();

                    match item {
                        Some(PayloadItem::Chunk(bytes)) => self.store_body(message, bytes)?,
                        Some(PayloadItem::Eof) => {
                            self.complete(message, true);
                            return Ok(true);
                        }
                        None => return Ok(false),
                    }
                }
                State::Finished => return Ok(true),
            }
        }
    }

    fn apply_head(&self, head: Head, message: &mut Message) -> Result<PayloadSize, ParseError> {
        let Head { kind, version_minor, headers } = head;

        if matches!(kind, MessageKind::Request(_)) {
            let mut cookies = FieldMap::new();
            for value in headers.get_all(header::COOKIE.as_str()) {
                parse_cookie_header(value, &mut cookies);
            }
            *message.cookies_mut() = cookies;
            message.set_chunks_supported(version_minor >= 1);
        }

        *message.kind_mut() = kind;
        message.set_version_major(1);
        message.set_version_minor(version_minor);
        *message.headers_mut() = headers;

        message.update_transfer_encoding_using_header();
        message.update_content_length_using_header()?;

        let bodiless_response = message.status_line().is_some_and(|line| !has_body(line.code()));
        let size = if bodiless_response {
            PayloadSize::Empty
        } else if message.is_chunked() {
            PayloadSize::Chunked
        } else if message.has_header(header::CONTENT_LENGTH.as_str()) {
            match message.content_length() {
                0 => PayloadSize::Empty,
                n => PayloadSize::Length(n as u64),
            }
        } else if message.is_request() {
            PayloadSize::Empty
        } else {
            PayloadSize::UntilEof
        };

        match size {
            PayloadSize::Length(length) => {
                ensure!(
                    message.content_length() <= self.options.max_content_length,
                    ParseError::too_large_content(length, self.options.max_content_length)
                );
                message.create_content_buffer();
            }
            // the chunk cache decides the length once the body is complete
            PayloadSize::Chunked | PayloadSize::UntilEof | PayloadSize::Empty => message.set_content_length(0),
        }

        trace!(?size, first_line = %message.first_line(), "decoded message head");
        Ok(size)
    }

    fn store_body(&mut self, message: &mut Message, bytes: Bytes) -> Result<(), ParseError> {
        trace!(len = bytes.len(), "read body bytes");

        if message.is_content_buffer_allocated() {
            let end = self.body_pos + bytes.len();
            match message.content_mut().get_mut(self.body_pos..end) {
                Some(dst) => dst.copy_from_slice(&bytes),
                None => return Err(ParseError::invalid_body("body exceeds content length")),
            }
            self.body_pos = end;
            return Ok(());
        }

        let cache = message.chunk_cache_mut();
        let total = cache.len() + bytes.len();
        ensure!(
            total <= self.options.max_content_length,
            ParseError::too_large_content(total as u64, self.options.max_content_length)
        );
        cache.extend_from_slice(&bytes);
        Ok(())
    }

    fn complete(&mut self, message: &mut Message, with_body: bool) {
        if with_body && matches!(self.size, PayloadSize::Chunked | PayloadSize::UntilEof) {
            message.concatenate_chunks();
        }
        message.set_status(DataStatus::Ok);
        message.set_is_valid(true);
        self.state = State::Finished;
    }
}

/// Whether a response with `code` may carry a body, RFC 9112 section 6.3.
fn has_body(code: StatusCode) -> bool {
    !(code.is_informational() || code == StatusCode::NO_CONTENT || code == StatusCode::NOT_MODIFIED)
}

impl MessageParser for HttpParser {
    fn set_read_buffer(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn parse(&mut self, message: &mut Message) -> ParseStatus {
        match self.decode_step(message) {
            Ok(true) => ParseStatus::Done,
            Ok(false) => {
                message.set_status(DataStatus::Pending);
                ParseStatus::NeedMore
            }
            Err(e) => {
                error!(cause = %e, consumed = self.consumed, "malformed http message");
                message.set_status(DataStatus::Error);
                message.set_is_valid(false);
                ParseStatus::Failed(e)
            }
        }
    }

    fn check_premature_eof(&mut self, message: &mut Message) -> bool {
        loop {
            let before = self.buf.len();
            let item = match &mut self.state {
                State::Finished => return false,
                State::Head => Err(ParseError::premature_eof()),
                State::Body(decoder) => decoder.decode_eof(&mut self.buf),
            };
            self.consumed += before - self.buf.len();

            let cause = match item {
                Ok(Some(PayloadItem::Chunk(bytes))) => match self.store_body(message, bytes) {
                    Ok(()) => continue,
                    Err(e) => e,
                },
                Ok(Some(PayloadItem::Eof)) => {
                    self.complete(message, true);
                    return false;
                }
                Ok(None) => ParseError::premature_eof(),
                Err(e) => e,
            };

            warn!(consumed = self.consumed, buffered = self.buf.len(), %cause, "stream ended inside a message");
            message.set_status(DataStatus::Error);
            return true;
        }
    }

    fn total_bytes_read(&self) -> usize {
        self.consumed
    }

    fn load_read_pos(&mut self) -> BytesMut {
        self.buf.split()
    }

    fn eof(&self) -> bool {
        self.buf.is_empty()
    }

    fn parse_headers_only(&mut self, headers_only: bool) {
        self.options.headers_only = headers_only;
    }

    fn is_headers_only(&self) -> bool {
        self.options.headers_only
    }

    fn set_max_content_length(&mut self, max_content_length: usize) {
        self.options.max_content_length = max_content_length;
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.state = State::Head;
        self.consumed = 0;
        self.body_pos = 0;
        self.size = PayloadSize::Empty;
    }
}
