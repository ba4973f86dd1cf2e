//! Whole-message transmission with a single vectored write.

use std::io::IoSlice;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::protocol::{Message, SendError};
use crate::utils::write_all_vectored;

impl Message {
    /// Sends the head and, unless `headers_only`, the content.
    ///
    /// `Connection` follows the connection's lifecycle. Returns the number of
    /// bytes written.
    pub async fn send<R, W>(&mut self, connection: &mut Connection<R, W>, headers_only: bool) -> Result<usize, SendError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if !connection.is_open() {
            warn!("send on a closed connection");
            return Err(SendError::ConnectionReset);
        }

        let mut head = BytesMut::new();
        self.prepare_buffers_for_send(&mut head, connection.keep_alive(), false);

        let content: &[u8] = if headers_only { &[] } else { self.content() };
        let mut bufs = [IoSlice::new(&head), IoSlice::new(content)];

        let written = connection.write(&mut bufs).await?;
        debug!(written, "sent message");
        Ok(written)
    }

    /// Serializes the message to any writer, e.g. a file.
    ///
    /// There is no connection to decide the lifecycle, so `Connection` is
    /// always `Keep-Alive`.
    pub async fn write_to<S>(&mut self, stream: &mut S, headers_only: bool) -> Result<usize, SendError>
    where
        S: AsyncWrite + Unpin,
    {
        let mut head = BytesMut::new();
        self.prepare_buffers_for_send(&mut head, true, false);

        let content: &[u8] = if headers_only { &[] } else { self.content() };
        let mut bufs = [IoSlice::new(&head), IoSlice::new(content)];

        Ok(write_all_vectored(stream, &mut bufs).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{HttpParser, MessageParser};
    use crate::connection::Lifecycle;
    use http::Method;
    use indoc::indoc;

    #[tokio::test]
    async fn send_response_over_connection() {
        let mut connection = Connection::new(tokio::io::empty(), Vec::<u8>::new());
        connection.set_lifecycle(Lifecycle::KeepAlive);
        let mut response = Message::response();
        response.set_content_type("text/plain");
        response.set_content("hello");

        let written = response.send(&mut connection, false).await.unwrap();

        let expected = indoc! {"
            HTTP/1.1 200 OK\r
            content-type: text/plain\r
            connection: Keep-Alive\r
            content-length: 5\r
            \r
            hello"};
        assert_eq!(written, expected.len());
        assert_eq!(std::str::from_utf8(connection.writer()).unwrap(), expected);
    }

    #[tokio::test]
    async fn headers_only_skips_content() {
        let mut connection = Connection::new(tokio::io::empty(), Vec::<u8>::new());
        let mut response = Message::response();
        response.set_content("hidden");

        response.send(&mut connection, true).await.unwrap();

        let wire = std::str::from_utf8(connection.writer()).unwrap();
        assert!(wire.ends_with("content-length: 6\r\n\r\n"));
        assert!(wire.contains("connection: close\r\n"));
    }

    #[tokio::test]
    async fn closed_connection_is_reset() {
        let mut connection = Connection::new(tokio::io::empty(), Vec::<u8>::new());
        connection.close();

        let error = Message::response().send(&mut connection, false).await.unwrap_err();

        assert!(matches!(error, SendError::ConnectionReset));
        assert!(connection.writer().is_empty());
    }

    #[tokio::test]
    async fn write_to_always_keeps_alive() {
        let mut response = Message::response();
        response.set_version_minor(0);
        response.change_header("Connection", "close");
        response.set_content("body");

        let mut wire = Vec::new();
        let written = response.write_to(&mut wire, true).await.unwrap();

        let expected = indoc! {"
            HTTP/1.0 200 OK\r
            connection: Keep-Alive\r
            content-length: 4\r
            \r
        "};
        assert_eq!(written, expected.len());
        assert_eq!(std::str::from_utf8(&wire).unwrap(), expected);
    }

    #[tokio::test]
    async fn serialized_request_parses_back() {
        let mut request = Message::request();
        {
            let line = request.request_line_mut().unwrap();
            line.set_method(Method::PUT);
            line.set_resource("/items/7");
            line.set_query("dry_run=1");
        }
        request.add_header("Host", "example.com");
        request.add_header("Accept", "text/html");
        request.add_header("Accept", "application/json");
        request.add_cookie("sid", "abc");
        request.set_content(b"{\"id\":7}");

        let mut wire = Vec::new();
        request.write_to(&mut wire, false).await.unwrap();

        let mut parser = HttpParser::request();
        let mut parsed = Message::request();
        parser.set_read_buffer(&wire);
        assert!(parser.parse(&mut parsed).is_done());

        assert_eq!(parsed.first_line(), request.first_line());
        assert_eq!(parsed.version_string(), "HTTP/1.1");
        assert_eq!(parsed.header("host"), "example.com");
        assert_eq!(parsed.headers().get_all("accept").collect::<Vec<_>>(), ["text/html", "application/json"]);
        assert_eq!(parsed.header("connection"), "Keep-Alive");
        assert_eq!(parsed.cookie("sid"), "abc");
        assert_eq!(parsed.content(), request.content());
        assert!(parser.eof());
    }
}
