//! The receive engine: drives a transport and a [`MessageParser`] until the
//! parser reaches a verdict, then derives the connection [`Lifecycle`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, warn};

use crate::codec::{HttpParser, MessageParser, ParseStatus, ParserOptions};
use crate::connection::{Connection, Lifecycle};
use crate::protocol::{HttpError, Message, ParseError, ReceiveError};

impl Message {
    /// Receives one message from `connection`.
    ///
    /// Bytes bookmarked by a previous pipelined receive are parsed first,
    /// without reading from the transport. On success the connection
    /// lifecycle reflects the message: kept alive, pipelined with the
    /// leftover bytes bookmarked, or closed. A message that only the end of
    /// the stream could complete always closes the connection.
    ///
    /// Returns the number of bytes the parser consumed.
    pub async fn receive<R, W, P>(&mut self, connection: &mut Connection<R, W>, parser: &mut P) -> Result<usize, ReceiveError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        P: MessageParser,
    {
        parser.reset();
        self.clear();

        let mut need_read = match connection.load_read_pos() {
            Some(leftover) => {
                debug!(len = leftover.len(), "parsing pipelined bytes");
                parser.set_read_buffer(&leftover);
                false
            }
            None => true,
        };

        let mut ended_by_eof = false;
        loop {
            if need_read {
                match connection.read_some().await {
                    Ok(n) if n > 0 => parser.set_read_buffer(connection.read_buffer()),
                    result => {
                        if parser.check_premature_eof(self) {
                            let source = match result {
                                Err(e) => ParseError::io(e),
                                Ok(_) => ParseError::premature_eof(),
                            };
                            warn!(consumed = parser.total_bytes_read(), cause = %source, "connection ended before message completed");
                            return Err(ReceiveError::new(parser.total_bytes_read(), source));
                        }
                        ended_by_eof = true;
                        break;
                    }
                }
            }
            need_read = true;

            match parser.parse(self) {
                ParseStatus::Done => break,
                ParseStatus::Failed(e) => return Err(ReceiveError::new(parser.total_bytes_read(), e)),
                ParseStatus::NeedMore => {}
            }
        }

        if !ended_by_eof && self.check_keep_alive() {
            if parser.eof() {
                debug!("keeping connection alive");
                connection.set_lifecycle(Lifecycle::KeepAlive);
            } else {
                debug!("connection is pipelined");
                connection.set_lifecycle(Lifecycle::Pipelined);
                connection.save_read_pos(parser.load_read_pos());
            }
        } else {
            debug!(ended_by_eof, "connection will be closed");
            connection.set_lifecycle(Lifecycle::Close);
            if parser.is_headers_only() {
                connection.save_read_pos(parser.load_read_pos());
            }
        }

        if let Some(addr) = connection.remote_addr() {
            self.set_remote_ip(addr.ip());
        }

        Ok(parser.total_bytes_read())
    }

    /// [`receive`](Message::receive) with a parser built for this message's
    /// variant.
    pub async fn receive_with<R, W>(
        &mut self,
        connection: &mut Connection<R, W>,
        headers_only: bool,
        max_content_length: usize,
    ) -> Result<usize, HttpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let options = ParserOptions::new().headers_only(headers_only).max_content_length(max_content_length);
        let mut parser = HttpParser::with_options(self.is_request(), options)?;
        Ok(self.receive(connection, &mut parser).await?)
    }

    /// Reads one message from `stream`, one byte at a time.
    ///
    /// Nothing past the end of the message is consumed from `stream`. There
    /// is no lifecycle bookkeeping.
    pub async fn read_from<S, P>(&mut self, stream: &mut S, parser: &mut P) -> Result<usize, ReceiveError>
    where
        S: AsyncRead + Unpin,
        P: MessageParser,
    {
        parser.reset();
        self.clear();

        let mut byte = [0u8; 1];
        loop {
            match stream.read(&mut byte).await {
                Ok(n) if n > 0 => parser.set_read_buffer(&byte),
                result => {
                    if parser.check_premature_eof(self) {
                        let source = match result {
                            Err(e) => ParseError::io(e),
                            Ok(_) => ParseError::premature_eof(),
                        };
                        warn!(consumed = parser.total_bytes_read(), cause = %source, "stream ended before message completed");
                        return Err(ReceiveError::new(parser.total_bytes_read(), source));
                    }
                    return Ok(parser.total_bytes_read());
                }
            }

            match parser.parse(self) {
                ParseStatus::Done => return Ok(parser.total_bytes_read()),
                ParseStatus::Failed(e) => return Err(ReceiveError::new(parser.total_bytes_read(), e)),
                ParseStatus::NeedMore => {}
            }
        }
    }

    /// [`read_from`](Message::read_from) with a parser built for this
    /// message's variant.
    pub async fn read_from_with<S>(
        &mut self,
        stream: &mut S,
        headers_only: bool,
        max_content_length: usize,
    ) -> Result<usize, HttpError>
    where
        S: AsyncRead + Unpin,
    {
        let options = ParserOptions::new().headers_only(headers_only).max_content_length(max_content_length);
        let mut parser = HttpParser::with_options(self.is_request(), options)?;
        Ok(self.read_from(stream, &mut parser).await?)
    }
}
