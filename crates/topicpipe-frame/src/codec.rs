use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Separates the topic from the payload. Only the first occurrence counts.
pub const DELIMITER: u8 = b' ';

/// A topic-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The topic this message was published under.
    pub topic: String,
    /// The message payload (may be empty).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────┬─────────────────┐
/// │ Topic (UTF-8)│ 0x20 │ Payload         │
/// └──────────────┴──────┴─────────────────┘
/// ```
pub fn encode_frame(topic: &str, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    validate_topic(topic)?;
    dst.reserve(topic.len() + 1 + payload.len());
    dst.put_slice(topic.as_bytes());
    dst.put_u8(DELIMITER);
    dst.put_slice(payload);
    Ok(())
}

/// Split a received message at the first delimiter into topic and payload.
pub fn decode_frame(message: Bytes) -> Result<Frame> {
    let split = message
        .iter()
        .position(|&b| b == DELIMITER)
        .ok_or(FrameError::MissingDelimiter)?;

    let topic = std::str::from_utf8(&message[..split])
        .map_err(|_| FrameError::InvalidTopic("topic is not valid UTF-8".to_string()))?
        .to_string();
    let payload = message.slice(split + 1..);

    Ok(Frame::new(topic, payload))
}

/// Check that `topic` can be framed unambiguously.
pub fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(FrameError::InvalidTopic("topic is empty".to_string()));
    }
    if topic.as_bytes().contains(&DELIMITER) {
        return Err(FrameError::InvalidTopic(format!(
            "topic {topic:?} contains the delimiter"
        )));
    }
    Ok(())
}
