use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified endpoint.
    #[error("failed to bind to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The endpoint string could not be parsed.
    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint { input: String, reason: &'static str },

    /// The endpoint kind is not available on this platform.
    #[error("unsupported endpoint: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
