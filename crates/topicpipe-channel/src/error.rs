use crate::direction::Direction;

/// Boxed source for codec implementations that are not known here.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while turning values into payloads and back.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] BoxError),

    /// The payload could not be deserialized into the requested type.
    #[error("failed to deserialize payload: {0}")]
    Deserialize(#[source] BoxError),

    /// The serialized bytes could not be compressed.
    #[error("failed to compress payload: {0}")]
    Compress(#[source] std::io::Error),

    /// The payload is not valid compressed data.
    #[error("failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),
}

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Invalid construction arguments. Raised before any socket is opened.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Send or receive on a closed channel.
    #[error("I/O operation on closed channel")]
    Closed,

    /// Send on an incoming channel, or receive on an outgoing one.
    #[error("{operation} is not supported on {direction} channels")]
    WrongDirection {
        operation: &'static str,
        direction: Direction,
    },

    /// Payload encoding or decoding failed. The channel stays open.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A received message was not a well-formed topic frame.
    #[error("frame error: {0}")]
    Frame(#[from] topicpipe_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] topicpipe_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
