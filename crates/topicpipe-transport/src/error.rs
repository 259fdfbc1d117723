/// Errors that can occur in pub/sub transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming subscriber connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint string could not be parsed.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidAddress { endpoint: String, reason: String },

    /// The message header contains an invalid magic number.
    #[error("invalid message magic (expected 0x5450 \"TP\")")]
    InvalidMagic,

    /// The message body exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The publisher did not complete the connection greeting.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The connection was closed before a complete message was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// The socket has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
