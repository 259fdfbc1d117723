use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Message header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "TP" (0x54 0x50).
pub const MAGIC: [u8; 2] = [0x54, 0x50];

/// Body of the first message a publisher sends on every subscriber connection.
pub const GREETING: &[u8] = b"TOPICPIPE/1";

/// Default maximum message body size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE: usize = 16 * 1024 * 1024;

/// Default time a subscriber waits for the connection and greeting.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single publisher write to one subscriber.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Encode one message body into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────────┬──────────────────┐
/// │ Magic (2B)   │ Length (4B LE) │ Body             │
/// │ 0x54 0x50    │                │ (Length bytes)   │
/// │ "TP"         │                │                  │
/// └──────────────┴────────────────┴──────────────────┘
/// ```
pub fn encode_message(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > u32::MAX as usize {
        return Err(TransportError::MessageTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(body.len() as u32);
    dst.put_slice(body);
    Ok(())
}

/// Decode one message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer.
pub fn decode_message(src: &mut BytesMut, max_message: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(TransportError::InvalidMagic);
    }

    let len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if len > max_message {
        return Err(TransportError::MessageTooLarge {
            size: len,
            max: max_message,
        });
    }

    if src.len() < HEADER_SIZE + len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

/// Configuration shared by publish and subscribe sockets.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Maximum message body size in bytes. Default: 16 MiB.
    pub max_message_size: usize,
    /// Bound on TCP connect plus greeting for subscribers. Default: 5s.
    pub connect_timeout: Duration,
    /// Write timeout applied to each subscriber connection on the publisher.
    /// A subscriber that stalls past it is dropped. Default: 1s. `None`
    /// lets a subscriber that stops reading block the publisher.
    pub write_timeout: Option<Duration>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let mut buf = BytesMut::new();
        encode_message(b"ABCD payload", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 12);

        let body = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(body.as_ref(), b"ABCD payload");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x54, 0x50, 0x01][..]);
        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_message(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);
        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0x49, 0x50, 0, 0, 0, 0][..]);
        assert!(matches!(
            decode_message(&mut buf, DEFAULT_MAX_MESSAGE),
            Err(TransportError::InvalidMagic)
        ));
    }

    #[test]
    fn test_decode_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024);
        assert!(matches!(
            decode_message(&mut buf, 512),
            Err(TransportError::MessageTooLarge { size: 1024, max: 512 })
        ));
    }

    #[test]
    fn test_back_to_back_messages() {
        let mut buf = BytesMut::new();
        encode_message(b"first", &mut buf).unwrap();
        encode_message(b"", &mut buf).unwrap();

        let first = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        let empty = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(first.as_ref(), b"first");
        assert!(empty.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn default_config_bounds_writes() {
        let config = SocketConfig::default();
        assert_eq!(config.write_timeout, Some(DEFAULT_WRITE_TIMEOUT));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
