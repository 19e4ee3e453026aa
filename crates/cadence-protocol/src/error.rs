use thiserror::Error;

/// Errors raised while moving records over a connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket read/write failure, including an oversized length prefix.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(String),

    /// The frame arrived but its payload is not a valid record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The peer closed the connection before a complete frame arrived.
    #[error("Connection closed before a frame was received")]
    ConnectionClosed,

    #[error("No request received within {ms}ms")]
    Timeout { ms: u64 },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
