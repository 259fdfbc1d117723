//! Minimal publish/subscribe transport over TCP.
//!
//! This is the lowest layer of topicpipe:
//! - [`PubSocket`] binds, accepts subscribers, and fans messages out to them
//! - [`SubSocket`] connects and filters delivered messages by byte prefix
//!
//! Delivery is best-effort and at-most-once. There is no reconnection,
//! acknowledgement, or flow control.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod publisher;
pub mod reader;
pub mod subscriber;
pub mod writer;

pub use codec::{
    SocketConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_MESSAGE, DEFAULT_WRITE_TIMEOUT, GREETING,
};
pub use endpoint::{Endpoint, WILDCARD_HOST};
pub use error::{Result, TransportError};
pub use publisher::PubSocket;
pub use subscriber::SubSocket;
