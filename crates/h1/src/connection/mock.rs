//! Scripted transport halves for connection tests.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Yields one scripted segment per read, then end of stream.
#[derive(Debug, Default)]
pub(crate) struct ScriptedReader {
    segments: VecDeque<Vec<u8>>,
    reads: usize,
}

impl ScriptedReader {
    pub(crate) fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self { segments: segments.into_iter().map(|s| s.as_ref().to_vec()).collect(), reads: 0 }
    }

    /// Number of `poll_read` calls that produced a result.
    pub(crate) fn reads(&self) -> usize {
        self.reads
    }
}

impl AsyncRead for ScriptedReader {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.reads += 1;

        if let Some(mut segment) = this.segments.pop_front() {
            let n = segment.len().min(buf.remaining());
            buf.put_slice(&segment[..n]);
            if n < segment.len() {
                this.segments.push_front(segment.split_off(n));
            }
        }
        Poll::Ready(Ok(()))
    }
}
