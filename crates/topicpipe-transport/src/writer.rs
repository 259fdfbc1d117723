use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_message;
use crate::error::{Result, TransportError};

/// Encode `body` and write the whole message to `inner` (blocking).
pub fn write_message<W: Write>(inner: &mut W, body: &[u8]) -> Result<()> {
    let mut buf = BytesMut::new();
    encode_message(body, &mut buf)?;
    write_encoded(inner, &buf)
}

/// Write an already-encoded message, retrying on interruption, then flush.
///
/// A socket write timeout surfaces as `WouldBlock`/`TimedOut` and is returned
/// as an error rather than retried.
pub fn write_encoded<W: Write>(inner: &mut W, wire: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < wire.len() {
        match inner.write(&wire[offset..]) {
            Ok(0) => return Err(TransportError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}
