//! Serializes the start line and header fields of a [`Message`].

use bytes::{BufMut, BytesMut};
use http::header;

use crate::protocol::{Message, MessageKind, append_cookie_header, append_set_cookie_headers};

/// Initial capacity reserved for a serialized head.
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Writes `first line CRLF`, the cookie lines, every header as
/// `key: value CRLF` and the blank line that ends the head.
#[derive(Debug)]
pub struct HeaderEncoder;

impl HeaderEncoder {
    pub fn encode_head(message: &Message, dst: &mut BytesMut) {
        dst.reserve(INIT_HEADER_SIZE);
        dst.put_slice(message.first_line().as_bytes());
        dst.put_slice(b"\r\n");

        // a request's cookie store replaces any stored cookie header
        let skip_cookie_header = match message.kind() {
            MessageKind::Request(_) => {
                append_cookie_header(message.cookies(), dst);
                !message.cookies().is_empty()
            }
            MessageKind::Response(_) => {
                append_set_cookie_headers(message.cookies(), dst);
                false
            }
        };

        for (key, value) in message.headers().iter() {
            if skip_cookie_header && key.eq_ignore_ascii_case(header::COOKIE.as_str()) {
                continue;
            }
            dst.put_slice(key.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }

        dst.put_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn request_cookies_replace_stored_header() {
        let mut message = Message::request();
        message.request_line_mut().unwrap().set_target("/search?q=rust");
        message.add_header("Host", "example.com");
        message.add_header("Cookie", "stale=1");
        message.add_cookie("sid", "abc");

        let mut dst = BytesMut::new();
        HeaderEncoder::encode_head(&message, &mut dst);

        let expected = indoc! {"
            GET /search?q=rust HTTP/1.1\r
            cookie: sid=abc\r
            Host: example.com\r
            \r
        "};
        assert_eq!(std::str::from_utf8(&dst[..]).unwrap(), expected);
    }

    #[test]
    fn stored_cookie_header_kept_without_cookie_store() {
        let mut message = Message::request();
        message.add_header("Cookie", "a=1");

        let mut dst = BytesMut::new();
        HeaderEncoder::encode_head(&message, &mut dst);

        assert_eq!(&dst[..], b"GET / HTTP/1.1\r\nCookie: a=1\r\n\r\n");
    }
}
