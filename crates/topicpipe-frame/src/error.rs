/// Errors that can occur during topic frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message has no space separating topic and payload.
    #[error("frame has no topic delimiter")]
    MissingDelimiter,

    /// The topic is empty, not UTF-8, or contains the delimiter.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
