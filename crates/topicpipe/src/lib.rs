//! Named value streams over publish/subscribe.
//!
//! topicpipe lets one process broadcast a sequence of structured values under
//! a channel name and tell every listener when the stream is over.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP publish/subscribe sockets with prefix filtering
//! - [`frame`] — `<topic> <payload>` framing and topic derivation
//! - [`channel`] — The [`Channel`] abstraction, codecs, and name handling

/// Re-export transport types.
pub mod transport {
    pub use topicpipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use topicpipe_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use topicpipe_channel::*;
}

pub use topicpipe_channel::{
    Channel, ChannelConfig, ChannelError, Codec, DefaultCodec, Direction, JsonCodec, Received,
    Zlib, DEFAULT_PORT,
};
