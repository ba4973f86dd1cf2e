//! The HTTP message entity shared by requests and responses.
//!
//! A [`Message`] owns everything needed to receive or transmit one HTTP/1.x
//! exchange: the request or status line, the protocol version, header and
//! cookie stores, the content buffer and the flags that select the
//! transmission mode. It is reusable: [`Message::clear`] brings it back to a
//! pristine state so a connection can process pipelined messages with one
//! instance.

use std::net::{IpAddr, Ipv4Addr};

use bytes::BytesMut;
use http::header;

use crate::codec::HeaderEncoder;
use crate::protocol::{ContentBuffer, FieldMap, ParseError, RequestLine, StatusLine};

/// Prefix of every version string.
pub const STRING_HTTP_VERSION: &str = "HTTP/";

/// Outcome of the last receive or parse attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataStatus {
    #[default]
    None,
    Ok,
    Error,
    Pending,
}

/// The closed set of message variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Request(RequestLine),
    Response(StatusLine),
}

impl MessageKind {
    fn reset(&mut self) {
        match self {
            MessageKind::Request(line) => *line = RequestLine::default(),
            MessageKind::Response(line) => *line = StatusLine::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    kind: MessageKind,
    version_major: u16,
    version_minor: u16,
    headers: FieldMap,
    cookies: FieldMap,
    content: ContentBuffer,
    content_length: usize,
    chunk_cache: Vec<u8>,
    is_valid: bool,
    is_chunked: bool,
    chunks_supported: bool,
    do_not_send_content_length: bool,
    has_missing_packets: bool,
    has_data_after_missing: bool,
    status: DataStatus,
    remote_ip: IpAddr,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            version_major: 1,
            version_minor: 1,
            headers: FieldMap::new(),
            cookies: FieldMap::new(),
            content: ContentBuffer::new(),
            content_length: 0,
            chunk_cache: Vec::new(),
            is_valid: false,
            is_chunked: false,
            chunks_supported: false,
            do_not_send_content_length: false,
            has_missing_packets: false,
            has_data_after_missing: false,
            status: DataStatus::None,
            remote_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// An empty `GET /` request.
    pub fn request() -> Self {
        Self::new(MessageKind::Request(RequestLine::default()))
    }

    /// An empty `200 OK` response.
    pub fn response() -> Self {
        Self::new(MessageKind::Response(StatusLine::default()))
    }

    /// A response matching the version and chunk support of `request`.
    pub fn response_for(request: &Message) -> Self {
        let mut response = Self::response();
        response.version_major = request.version_major;
        response.version_minor = request.version_minor;
        response.chunks_supported = request.chunks_supported;
        response
    }

    /// Resets everything but the message variant.
    pub fn clear(&mut self) {
        self.kind.reset();
        self.version_major = 1;
        self.version_minor = 1;
        self.headers.clear();
        self.cookies.clear();
        self.content.clear();
        self.content_length = 0;
        self.chunk_cache.clear();
        self.is_valid = false;
        self.is_chunked = false;
        self.chunks_supported = false;
        self.do_not_send_content_length = false;
        self.has_missing_packets = false;
        self.has_data_after_missing = false;
        self.status = DataStatus::None;
        self.remote_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut MessageKind {
        &mut self.kind
    }

    pub fn is_request(&self) -> bool {
        matches!(self.kind, MessageKind::Request(_))
    }

    pub fn request_line(&self) -> Option<&RequestLine> {
        match &self.kind {
            MessageKind::Request(line) => Some(line),
            MessageKind::Response(_) => None,
        }
    }

    pub fn request_line_mut(&mut self) -> Option<&mut RequestLine> {
        match &mut self.kind {
            MessageKind::Request(line) => Some(line),
            MessageKind::Response(_) => None,
        }
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        match &self.kind {
            MessageKind::Response(line) => Some(line),
            MessageKind::Request(_) => None,
        }
    }

    pub fn status_line_mut(&mut self) -> Option<&mut StatusLine> {
        match &mut self.kind {
            MessageKind::Response(line) => Some(line),
            MessageKind::Request(_) => None,
        }
    }

    /// The request or status line, built from the current fields.
    pub fn first_line(&self) -> String {
        let version = self.version_string();
        match &self.kind {
            MessageKind::Request(line) => line.first_line(&version),
            MessageKind::Response(line) => line.first_line(&version),
        }
    }

    pub fn version_major(&self) -> u16 {
        self.version_major
    }

    pub fn version_minor(&self) -> u16 {
        self.version_minor
    }

    pub fn set_version_major(&mut self, major: u16) {
        self.version_major = major;
    }

    pub fn set_version_minor(&mut self, minor: u16) {
        self.version_minor = minor;
    }

    /// e.g. `HTTP/1.1`
    pub fn version_string(&self) -> String {
        format!("{STRING_HTTP_VERSION}{}.{}", self.version_major, self.version_minor)
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn set_content_length(&mut self, length: usize) {
        self.content_length = length;
    }

    /// (Re)allocates the content buffer to hold `content_length` bytes.
    pub fn create_content_buffer(&mut self) -> &mut [u8] {
        self.content.resize(self.content_length);
        self.content.as_bytes_mut()
    }

    pub fn content(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn content_mut(&mut self) -> &mut [u8] {
        self.content.as_bytes_mut()
    }

    pub fn content_buffer(&self) -> &ContentBuffer {
        &self.content
    }

    pub fn content_buffer_size(&self) -> usize {
        self.content.len()
    }

    pub fn is_content_buffer_allocated(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn set_content<B: AsRef<[u8]>>(&mut self, content: B) {
        let content = content.as_ref();
        self.content_length = content.len();
        self.create_content_buffer().copy_from_slice(content);
    }

    /// Drops the content and the `Content-Type` header.
    pub fn clear_content(&mut self) {
        self.content_length = 0;
        self.content.clear();
        self.headers.delete(header::CONTENT_TYPE.as_str());
    }

    pub fn set_content_type<S: Into<String>>(&mut self, content_type: S) {
        self.headers.change(header::CONTENT_TYPE.as_str(), content_type);
    }

    /// Received chunk bytes waiting for [`concatenate_chunks`](Message::concatenate_chunks).
    pub fn chunk_cache(&self) -> &[u8] {
        &self.chunk_cache
    }

    pub fn chunk_cache_mut(&mut self) -> &mut Vec<u8> {
        &mut self.chunk_cache
    }

    /// Moves the chunk cache into the content buffer.
    pub fn concatenate_chunks(&mut self) {
        self.content_length = self.chunk_cache.len();
        self.create_content_buffer();
        self.content.as_bytes_mut().copy_from_slice(&self.chunk_cache);
        self.chunk_cache.clear();
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn set_is_valid(&mut self, valid: bool) {
        self.is_valid = valid;
    }

    pub fn is_chunked(&self) -> bool {
        self.is_chunked
    }

    pub fn chunks_supported(&self) -> bool {
        self.chunks_supported
    }

    pub fn set_chunks_supported(&mut self, supported: bool) {
        self.chunks_supported = supported;
    }

    pub fn do_not_send_content_length(&self) -> bool {
        self.do_not_send_content_length
    }

    pub fn set_do_not_send_content_length(&mut self) {
        self.do_not_send_content_length = true;
    }

    /// Whether the bytes this message was parsed from had gaps, e.g. when
    /// reassembled from captured packets.
    pub fn has_missing_packets(&self) -> bool {
        self.has_missing_packets
    }

    pub fn set_missing_packets(&mut self, missing: bool) {
        self.has_missing_packets = missing;
    }

    /// Whether content followed a gap.
    pub fn has_data_after_missing_packets(&self) -> bool {
        self.has_data_after_missing
    }

    pub fn set_data_after_missing_packets(&mut self, data_after: bool) {
        self.has_data_after_missing = data_after;
    }

    pub fn status(&self) -> DataStatus {
        self.status
    }

    pub fn set_status(&mut self, status: DataStatus) {
        self.status = status;
    }

    pub fn remote_ip(&self) -> IpAddr {
        self.remote_ip
    }

    pub fn set_remote_ip(&mut self, ip: IpAddr) {
        self.remote_ip = ip;
    }

    pub fn headers(&self) -> &FieldMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut FieldMap {
        &mut self.headers
    }

    /// The first value of `key`, or `""` when absent.
    pub fn header(&self, key: &str) -> &str {
        self.headers.get(key).unwrap_or_default()
    }

    pub fn has_header(&self, key: &str) -> bool {
        self.headers.has(key)
    }

    pub fn add_header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.add(key, value);
    }

    pub fn change_header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.change(key, value);
    }

    pub fn delete_header(&mut self, key: &str) {
        self.headers.delete(key);
    }

    pub fn cookies(&self) -> &FieldMap {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut FieldMap {
        &mut self.cookies
    }

    /// The first value of cookie `key`, or `""` when absent.
    pub fn cookie(&self, key: &str) -> &str {
        self.cookies.get(key).unwrap_or_default()
    }

    pub fn has_cookie(&self, key: &str) -> bool {
        self.cookies.has(key)
    }

    pub fn add_cookie<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.cookies.add(key, value);
    }

    pub fn change_cookie<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.cookies.change(key, value);
    }

    pub fn delete_cookie(&mut self, key: &str) {
        self.cookies.delete(key);
    }

    /// Sets `content_length` from the `Content-Length` header, zero when absent.
    pub fn update_content_length_using_header(&mut self) -> Result<(), ParseError> {
        self.content_length = match self.headers.get(header::CONTENT_LENGTH.as_str()) {
            None => 0,
            Some(value) => {
                let trimmed = value.trim();
                trimmed
                    .parse::<usize>()
                    .map_err(|_| ParseError::invalid_content_length(format!("value {trimmed} is not usize")))?
            }
        };
        Ok(())
    }

    /// Sets `is_chunked` when `Transfer-Encoding` mentions `chunked`.
    ///
    /// Other transfer-codings are ignored for now.
    pub fn update_transfer_encoding_using_header(&mut self) {
        const CHUNKED: &[u8] = b"chunked";
        // transfer-coding values are case-insensitive, RFC 2616 section 3.6
        self.is_chunked = self.headers.get(header::TRANSFER_ENCODING.as_str()).is_some_and(|value| {
            value.as_bytes().windows(CHUNKED.len()).any(|window| window.eq_ignore_ascii_case(CHUNKED))
        });
    }

    /// Whether the connection may stay open after this message.
    pub fn check_keep_alive(&self) -> bool {
        !self.header(header::CONNECTION.as_str()).eq_ignore_ascii_case("close")
            && (self.version_major > 1 || (self.version_major == 1 && self.version_minor >= 1))
    }

    /// Updates `Connection` and the framing headers ahead of a send.
    pub fn prepare_headers_for_send(&mut self, keep_alive: bool, using_chunks: bool) {
        self.change_header(header::CONNECTION.as_str(), if keep_alive { "Keep-Alive" } else { "close" });
        if using_chunks {
            if self.chunks_supported {
                self.change_header(header::TRANSFER_ENCODING.as_str(), "chunked");
            }
        } else if !self.do_not_send_content_length {
            self.change_header(header::CONTENT_LENGTH.as_str(), self.content_length.to_string());
        }
    }

    /// Serializes the first line and headers into `dst`.
    pub fn prepare_buffers_for_send(&mut self, dst: &mut BytesMut, keep_alive: bool, using_chunks: bool) {
        self.prepare_headers_for_send(keep_alive, using_chunks);
        HeaderEncoder::encode_head(self, dst);
    }
}
