//! Topic-prefixed message framing for topicpipe.
//!
//! Every message on the wire is `<topic> <payload>`: a UTF-8 topic, a single
//! ASCII space, then the payload bytes. Each channel owns a data topic and a
//! derived end-of-stream topic.

pub mod codec;
pub mod error;
pub mod topic;

pub use codec::{decode_frame, encode_frame, validate_topic, Frame, DELIMITER};
pub use error::{FrameError, Result};
pub use topic::{FrameKind, Topics, EOF_SUFFIX};
