use std::fmt;
use std::str::FromStr;

use topicpipe_transport::WILDCARD_HOST;

use crate::error::ChannelError;

/// Host an incoming channel connects to when none is given.
pub const DEFAULT_INCOMING_HOST: &str = "localhost";

/// Which end of the stream a channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Subscribes and receives values.
    Incoming,
    /// Binds, publishes values, and signals end-of-stream on close.
    Outgoing,
}

impl Direction {
    /// Host used when the caller does not supply one.
    pub fn default_host(self) -> &'static str {
        match self {
            Direction::Incoming => DEFAULT_INCOMING_HOST,
            Direction::Outgoing => WILDCARD_HOST,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Incoming => "INCOMING",
            Direction::Outgoing => "OUTGOING",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incoming" | "in" => Ok(Direction::Incoming),
            "outgoing" | "out" => Ok(Direction::Outgoing),
            _ => Err(ChannelError::Configuration(format!(
                "unexpected direction: {s:?}"
            ))),
        }
    }
}
