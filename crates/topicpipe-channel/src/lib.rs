//! Named, directional value channels over topic-filtered pub/sub.
//!
//! A [`Channel`] is either outgoing (binds and publishes) or incoming
//! (connects and subscribes). Values pass through a [`Codec`] pipeline,
//! JSON then zlib by default, and are framed under the channel's name.
//! Closing an outgoing channel publishes an end-of-stream frame; incoming
//! channels close themselves when they receive it.
//!
//! ```no_run
//! use topicpipe_channel::{Channel, ChannelConfig};
//!
//! # fn main() -> topicpipe_channel::Result<()> {
//! let mut out = Channel::open_with_config(ChannelConfig::outgoing().with_name("TICKS"))?;
//! out.send(&[1.5, 2.5])?;
//! out.close()?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod direction;
pub mod error;
pub mod name;

pub use channel::{is_disconnect, Channel, Received, Values};
pub use codec::{Codec, DefaultCodec, JsonCodec, Zlib, DEFAULT_COMPRESSION_LEVEL};
pub use config::{ChannelConfig, DEFAULT_PORT};
pub use direction::{Direction, DEFAULT_INCOMING_HOST};
pub use error::{ChannelError, CodecError, Result};
pub use name::{generate_name, validate_name, GENERATED_NAME_LEN};
