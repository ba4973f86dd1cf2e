//! Response specific parts of a [`Message`](crate::protocol::Message).

use bytes::{BufMut, BytesMut};
use http::StatusCode;

use crate::protocol::FieldMap;

/// The status code and reason phrase of a response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    code: StatusCode,
    message: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl StatusLine {
    /// Creates a status line using the canonical reason phrase of `code`.
    pub fn new(code: StatusCode) -> Self {
        Self { code, message: code.canonical_reason().unwrap_or_default().to_string() }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Sets the code and resets the reason phrase to its canonical value.
    pub fn set_code(&mut self, code: StatusCode) {
        *self = Self::new(code);
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message<S: Into<String>>(&mut self, message: S) {
        self.message = message.into();
    }

    pub(crate) fn first_line(&self, version: &str) -> String {
        format!("{} {} {}", version, self.code.as_str(), self.message)
    }
}

/// Writes one `Set-Cookie: name=value` line per cookie.
pub(crate) fn append_set_cookie_headers(cookies: &FieldMap, dst: &mut BytesMut) {
    for (name, value) in cookies.iter() {
        dst.put_slice(http::header::SET_COOKIE.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(name.as_bytes());
        dst.put_u8(b'=');
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_reason_by_default() {
        let mut line = StatusLine::default();
        assert_eq!(line.first_line("HTTP/1.1"), "HTTP/1.1 200 OK");

        line.set_code(StatusCode::NOT_FOUND);
        assert_eq!(line.message(), "Not Found");

        line.set_message("Nowhere");
        assert_eq!(line.first_line("HTTP/1.0"), "HTTP/1.0 404 Nowhere");
    }

    #[test]
    fn one_set_cookie_line_per_cookie() {
        let cookies: FieldMap = [("a", "1"), ("b", "2")].into_iter().collect();
        let mut dst = BytesMut::new();
        append_set_cookie_headers(&cookies, &mut dst);
        assert_eq!(&dst[..], b"set-cookie: a=1\r\nset-cookie: b=2\r\n");
    }
}
