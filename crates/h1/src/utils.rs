//! Internal helpers: the `ensure!` guard and a vectored write loop.

use std::io::{self, ErrorKind, IoSlice};

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
///
/// ```ignore
/// ensure!(len <= max, ParseError::too_large_header(len, max));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Writes every slice in `bufs` to `writer`, then flushes it.
///
/// Uses vectored writes so that a head buffer and any number of payload
/// buffers leave in as few syscalls as the writer allows. Returns the total
/// number of bytes written.
pub(crate) async fn write_all_vectored<W>(writer: &mut W, mut bufs: &mut [IoSlice<'_>]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    // drop leading empty slices, otherwise a write of 0 looks like a closed peer
    IoSlice::advance_slices(&mut bufs, 0);

    while !bufs.is_empty() {
        match writer.write_vectored(bufs).await {
            Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => {
                written += n;
                IoSlice::advance_slices(&mut bufs, n);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_every_slice_in_order() {
        let mut out = Vec::new();
        let mut bufs = [IoSlice::new(b""), IoSlice::new(b"abc"), IoSlice::new(b""), IoSlice::new(b"defg")];

        let written = write_all_vectored(&mut out, &mut bufs).await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(&out[..], b"abcdefg");
    }

    #[tokio::test]
    async fn empty_list_writes_nothing() {
        let mut out = Vec::new();
        let written = write_all_vectored(&mut out, &mut []).await.unwrap();
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
