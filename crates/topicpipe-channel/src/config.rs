use std::time::Duration;

use topicpipe_transport::SocketConfig;

use crate::direction::Direction;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 22184;

/// Construction parameters for a [`Channel`](crate::Channel).
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub direction: Direction,
    /// Channel name; generated when `None`.
    pub name: Option<String>,
    /// Host to bind or connect; direction-specific default when `None`.
    pub host: Option<String>,
    /// Port to bind or connect. `0` binds an ephemeral port (outgoing only).
    pub port: u16,
    /// Transport tuning.
    pub socket: SocketConfig,
}

impl ChannelConfig {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            name: None,
            host: None,
            port: DEFAULT_PORT,
            socket: SocketConfig::default(),
        }
    }

    pub fn incoming() -> Self {
        Self::new(Direction::Incoming)
    }

    pub fn outgoing() -> Self {
        Self::new(Direction::Outgoing)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound on connect plus transport greeting for incoming channels.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.socket.connect_timeout = timeout;
        self
    }

    /// Bound on each write to one subscriber of an outgoing channel. A
    /// subscriber that stays blocked past it is disconnected. `None` waits
    /// indefinitely.
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.socket.write_timeout = timeout;
        self
    }

    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.socket.max_message_size = max;
        self
    }

    /// Host after applying the direction default.
    pub fn resolved_host(&self) -> &str {
        self.host
            .as_deref()
            .unwrap_or_else(|| self.direction.default_host())
    }
}
