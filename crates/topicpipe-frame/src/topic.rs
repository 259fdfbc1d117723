//! Data and end-of-stream topics derived from a channel name.
//!
//! A channel named `ABCD` publishes data under `ABCD` and its terminal
//! signal under `ABCD!`. Subscriptions include the trailing delimiter so that
//! `ABC` does not match frames published by `ABCD`.

use crate::codec::{Frame, DELIMITER};

/// Appended to a channel name to form its end-of-stream topic.
pub const EOF_SUFFIX: char = '!';

/// How a received frame relates to a channel's topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    EndOfStream,
    Foreign,
}

/// The pair of topics owned by one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    data: String,
    eof: String,
}

impl Topics {
    /// Derive both topics from a channel name.
    pub fn for_name(name: &str) -> Self {
        Self {
            data: name.to_string(),
            eof: format!("{name}{EOF_SUFFIX}"),
        }
    }

    /// Topic carrying values.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Topic carrying the end-of-stream signal.
    pub fn eof(&self) -> &str {
        &self.eof
    }

    /// Subscription prefix for data frames: topic plus delimiter.
    pub fn data_prefix(&self) -> Vec<u8> {
        delimited(&self.data)
    }

    /// Subscription prefix for the end-of-stream frame: topic plus delimiter.
    pub fn eof_prefix(&self) -> Vec<u8> {
        delimited(&self.eof)
    }

    /// Classify a decoded frame.
    pub fn classify(&self, frame: &Frame) -> FrameKind {
        if frame.topic == self.eof {
            FrameKind::EndOfStream
        } else if frame.topic == self.data {
            FrameKind::Data
        } else {
            FrameKind::Foreign
        }
    }
}

fn delimited(topic: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(topic.len() + 1);
    prefix.extend_from_slice(topic.as_bytes());
    prefix.push(DELIMITER);
    prefix
}
