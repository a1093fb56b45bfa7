//! Link error types.

use thiserror::Error;

/// Errors raised by a connector or a live connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinkError {
    /// An I/O error occurred.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    /// The peer refused the connection attempt.
    #[error("connection refused: {0}")]
    Refused(String),

    /// The connection is already closed.
    #[error("connection closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: LinkError = io_err.into();
        assert!(matches!(err, LinkError::Io(_)));
        assert_eq!(err.to_string(), "link I/O error: refused");
    }

    #[test]
    fn frame_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: LinkError = json_err.into();
        assert!(err.to_string().starts_with("malformed frame"));
    }
}
