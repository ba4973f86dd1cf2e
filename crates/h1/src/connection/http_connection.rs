use std::fmt;
use std::io::{self, ErrorKind, IoSlice};
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::write_all_vectored;

/// Default size of a connection's read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// What happens to a connection once the current exchange is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Close,
    KeepAlive,
    /// Kept alive, and bytes of the next message are already buffered.
    Pipelined,
}

/// Closes a [`Connection`] from outside the task driving it.
///
/// A read or write in progress completes with
/// [`ErrorKind::ConnectionAborted`] instead of waiting for the peer.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    token: CancellationToken,
}

impl CloseHandle {
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

fn aborted() -> io::Error {
    io::Error::new(ErrorKind::ConnectionAborted, "connection closed locally")
}

/// An HTTP/1.x connection over a read half and a write half.
///
/// Besides plain I/O, the connection remembers the [`Lifecycle`] decided by
/// the last receive, and keeps a bookmark of bytes that were read past the
/// end of a message so the next receive starts from them.
pub struct Connection<R, W> {
    reader: R,
    writer: W,
    read_buf: BytesMut,
    capacity: usize,
    bookmark: BytesMut,
    lifecycle: Lifecycle,
    closer: CancellationToken,
    remote_addr: Option<SocketAddr>,
}

impl<R, W> fmt::Debug for Connection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("buffered", &self.read_buf.len())
            .field("bookmarked", &self.bookmark.len())
            .field("lifecycle", &self.lifecycle)
            .field("open", &self.is_open())
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}

impl<R, W> Connection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_capacity(reader, writer, DEFAULT_READ_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, writer: W, read_buffer_size: usize) -> Self {
        Self {
            reader,
            writer,
            read_buf: BytesMut::with_capacity(read_buffer_size),
            capacity: read_buffer_size.max(1),
            bookmark: BytesMut::new(),
            lifecycle: Lifecycle::default(),
            closer: CancellationToken::new(),
            remote_addr: None,
        }
    }

    /// Peer address copied into received messages.
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Bytes filled by the last [`read_some`](Connection::read_some).
    pub fn read_buffer(&self) -> &[u8] {
        &self.read_buf
    }

    pub fn is_open(&self) -> bool {
        !self.closer.is_cancelled()
    }

    /// Marks the connection closed and aborts any read or write in progress.
    pub fn close(&self) {
        self.closer.cancel();
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle { token: self.closer.clone() }
    }

    pub fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn keep_alive(&self) -> bool {
        self.lifecycle != Lifecycle::Close
    }

    pub fn is_pipelined(&self) -> bool {
        self.lifecycle == Lifecycle::Pipelined
    }

    /// Keeps `leftover` for the next receive.
    pub fn save_read_pos(&mut self, leftover: BytesMut) {
        debug!(bookmarked = leftover.len(), "saving read position");
        self.bookmark = leftover;
    }

    /// Takes the bytes saved by [`save_read_pos`](Connection::save_read_pos).
    pub fn load_read_pos(&mut self) -> Option<BytesMut> {
        if self.bookmark.is_empty() {
            return None;
        }
        Some(self.bookmark.split())
    }
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Reads the next batch of bytes into [`read_buffer`](Connection::read_buffer).
    ///
    /// `Ok(0)` means the peer closed its side.
    pub async fn read_some(&mut self) -> io::Result<usize> {
        if !self.is_open() {
            return Err(aborted());
        }

        self.read_buf.clear();
        self.read_buf.reserve(self.capacity);

        let n = select! {
            biased;
            _ = self.closer.cancelled() => return Err(aborted()),
            result = self.reader.read_buf(&mut self.read_buf) => result?,
        };

        trace!(n, "read bytes from connection");
        Ok(n)
    }

    /// Writes every buffer with vectored writes and flushes.
    pub async fn write(&mut self, bufs: &mut [IoSlice<'_>]) -> io::Result<usize> {
        if !self.is_open() {
            return Err(aborted());
        }

        select! {
            biased;
            _ = self.closer.cancelled() => Err(aborted()),
            result = write_all_vectored(&mut self.writer, bufs) => result,
        }
    }

    /// Ends the exchange: shuts the write half down when the lifecycle is
    /// [`Lifecycle::Close`].
    pub async fn finish(&mut self) -> io::Result<()> {
        if self.lifecycle != Lifecycle::Close || !self.is_open() {
            return Ok(());
        }

        debug!("closing connection after exchange");
        self.close();
        self.writer.shutdown().await
    }
}
