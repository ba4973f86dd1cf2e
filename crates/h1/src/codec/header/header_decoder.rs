//! Decodes the start line and header fields of a request or response.
//!
//! Parsing is delegated to `httparse`; the decoder enforces the header size
//! and count limits and turns the borrowed result into an owned [`Head`].

use bytes::{Buf, BytesMut};
use http::{Method, StatusCode};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{FieldMap, MessageKind, ParseError, RequestLine, StatusLine};
use crate::utils::ensure;

/// Maximum number of header fields in one message.
pub const MAX_HEADER_NUM: usize = 64;

/// Default limit for the size of the start line plus all header fields.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Shorter input can never hold a complete head.
pub(crate) const MIN_HEAD_LEN: usize = 14;

/// An owned, decoded message head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub kind: MessageKind,
    pub version_minor: u16,
    pub headers: FieldMap,
}

#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    is_request: bool,
    max_header_bytes: usize,
}

impl HeaderDecoder {
    pub fn new(is_request: bool, max_header_bytes: usize) -> Self {
        Self { is_request, max_header_bytes }
    }

    pub fn is_request(&self) -> bool {
        self.is_request
    }
}

fn map_httparse_error(error: Error) -> ParseError {
    match error {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        Error::Version => ParseError::InvalidVersion(None),
        Error::Status => ParseError::InvalidStatus(None),
        e => ParseError::invalid_header(e),
    }
}

fn collect_headers(parsed: &[httparse::Header<'_>]) -> FieldMap {
    parsed.iter().map(|header| (header.name, String::from_utf8_lossy(header.value).into_owned())).collect()
}

fn check_version(version: Option<u8>) -> Result<u16, ParseError> {
    match version {
        Some(minor @ (0 | 1)) => Ok(u16::from(minor)),
        other => Err(ParseError::InvalidVersion(other)),
    }
}

impl Decoder for HeaderDecoder {
    type Item = Head;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < MIN_HEAD_LEN {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];

        let (head, head_len) = if self.is_request {
            let mut req = httparse::Request::new(&mut headers);
            let head_len = match req.parse(&src[..]).map_err(map_httparse_error)? {
                Status::Complete(len) => len,
                Status::Partial => {
                    ensure!(src.len() <= self.max_header_bytes, ParseError::too_large_header(src.len(), self.max_header_bytes));
                    return Ok(None);
                }
            };

            let method = req.method.ok_or(ParseError::InvalidMethod)?;
            let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::InvalidMethod)?;
            let target = req.path.ok_or_else(|| ParseError::invalid_header("missing request target"))?;

            let mut line = RequestLine::new(method, "");
            line.set_target(target);

            let head = Head {
                kind: MessageKind::Request(line),
                version_minor: check_version(req.version)?,
                headers: collect_headers(req.headers),
            };
            (head, head_len)
        } else {
            let mut res = httparse::Response::new(&mut headers);
            let head_len = match res.parse(&src[..]).map_err(map_httparse_error)? {
                Status::Complete(len) => len,
                Status::Partial => {
                    ensure!(src.len() <= self.max_header_bytes, ParseError::too_large_header(src.len(), self.max_header_bytes));
                    return Ok(None);
                }
            };

            let code = res.code.ok_or(ParseError::InvalidStatus(None))?;
            let code = StatusCode::from_u16(code).map_err(|_| ParseError::InvalidStatus(Some(code)))?;

            let mut line = StatusLine::new(code);
            if let Some(reason) = res.reason.filter(|reason| !reason.is_empty()) {
                line.set_message(reason);
            }

            let head = Head {
                kind: MessageKind::Response(line),
                version_minor: check_version(res.version)?,
                headers: collect_headers(res.headers),
            };
            (head, head_len)
        };

        ensure!(head_len <= self.max_header_bytes, ParseError::too_large_header(head_len, self.max_header_bytes));
        trace!(head_len, header_count = head.headers.len(), "parsed message head");

        src.advance(head_len);
        Ok(Some(head))
    }
}
