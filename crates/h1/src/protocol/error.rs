use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("receive error: {source}")]
    ReceiveError {
        #[from]
        source: ReceiveError,
    },

    #[error("send error: {source}")]
    SendError {
        #[from]
        source: SendError,
    },

    #[error("config error: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http status code: {0:?}")]
    InvalidStatus(Option<u16>),

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("content length {length} exceed the limit {max_length}")]
    TooLargeContent { length: u64, max_length: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_content(length: u64, max_length: usize) -> Self {
        Self::TooLargeContent { length, max_length }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The peer closed the stream before the message was structurally complete.
    pub fn premature_eof() -> Self {
        Self::io(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before message completed"))
    }

    pub fn is_premature_eof(&self) -> bool {
        matches!(self, Self::Io { source } if source.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// A failed receive or read, together with the number of bytes the parser had
/// consumed when it stopped.
#[derive(Error, Debug)]
#[error("receive failed after {bytes_read} bytes: {source}")]
pub struct ReceiveError {
    bytes_read: usize,
    #[source]
    source: ParseError,
}

impl ReceiveError {
    pub fn new(bytes_read: usize, source: ParseError) -> Self {
        Self { bytes_read, source }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn kind(&self) -> &ParseError {
        &self.source
    }

    pub fn into_source(self) -> ParseError {
        self.source
    }

    pub fn is_premature_eof(&self) -> bool {
        self.source.is_premature_eof()
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("connection reset, the connection is already closed")]
    ConnectionReset,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn is_connection_reset(&self) -> bool {
        match self {
            Self::ConnectionReset => true,
            Self::Io { source } => {
                matches!(source.kind(), io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid_option<S: ToString>(name: &'static str, reason: S) -> Self {
        Self::InvalidOption { name, reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premature_eof_is_an_io_error() {
        let error = ParseError::premature_eof();
        assert!(error.is_premature_eof());
        assert!(matches!(error, ParseError::Io { .. }));

        let error = ParseError::invalid_body("bad chunk");
        assert!(!error.is_premature_eof());
    }

    #[test]
    fn receive_error_keeps_byte_count() {
        let error = ReceiveError::new(42, ParseError::premature_eof());
        assert_eq!(error.bytes_read(), 42);
        assert!(error.is_premature_eof());
        assert!(error.to_string().starts_with("receive failed after 42 bytes"));
    }

    #[test]
    fn reset_and_aborted_writes_are_connection_resets() {
        assert!(SendError::ConnectionReset.is_connection_reset());
        assert!(SendError::io(io::Error::from(io::ErrorKind::ConnectionAborted)).is_connection_reset());
        assert!(!SendError::io(io::Error::from(io::ErrorKind::WriteZero)).is_connection_reset());
    }
}
