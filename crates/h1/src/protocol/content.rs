//! Owned payload storage for a [`Message`](crate::protocol::Message).

use std::fmt;

/// Byte that always follows the last content byte.
pub const TERMINATOR: u8 = 0;

static EMPTY: [u8; 1] = [TERMINATOR];

/// Resizable byte buffer that always keeps a trailing [`TERMINATOR`] byte.
///
/// A zero length buffer owns no allocation. Cloning makes a deep copy, and
/// [`resize`](ContentBuffer::resize) reallocates and discards the old content.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ContentBuffer {
    buf: Option<Box<[u8]>>,
}

impl ContentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled buffer holding `len` content bytes.
    pub fn with_len(len: usize) -> Self {
        let mut buffer = Self::new();
        buffer.resize(len);
        buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.as_ref().map_or(0, |buf| buf.len() - 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_none()
    }

    /// The content bytes, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.buf {
            Some(buf) => &buf[..buf.len() - 1],
            None => &[],
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.buf {
            Some(buf) => {
                let len = buf.len() - 1;
                &mut buf[..len]
            }
            None => &mut [],
        }
    }

    /// The content bytes followed by the terminator.
    pub fn as_bytes_with_terminator(&self) -> &[u8] {
        match &self.buf {
            Some(buf) => &buf[..],
            None => &EMPTY[..],
        }
    }

    /// Reallocates the buffer to hold `len` zeroed bytes.
    pub fn resize(&mut self, len: usize) {
        self.buf = if len == 0 { None } else { Some(vec![TERMINATOR; len + 1].into_boxed_slice()) };
    }

    pub fn clear(&mut self) {
        self.resize(0);
    }
}

impl From<&[u8]> for ContentBuffer {
    fn from(bytes: &[u8]) -> Self {
        let mut buffer = Self::with_len(bytes.len());
        buffer.as_bytes_mut().copy_from_slice(bytes);
        buffer
    }
}

impl AsRef<[u8]> for ContentBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for ContentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBuffer").field("len", &self.len()).finish()
    }
}
