use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace};

use crate::codec::{SocketConfig, GREETING};
use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::reader::MessageReader;

/// Subscribing side of the pub/sub transport.
///
/// Connects to a [`PubSocket`](crate::PubSocket) and delivers only messages
/// whose body starts with one of the subscribed prefixes. A socket with no
/// subscriptions delivers nothing; an empty prefix matches everything.
pub struct SubSocket {
    endpoint: Endpoint,
    reader: MessageReader<TcpStream>,
    control: TcpStream,
    subscriptions: Vec<Vec<u8>>,
}

impl SubSocket {
    /// Connect with default configuration.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_with_config(endpoint, SocketConfig::default())
    }

    /// Connect with explicit configuration.
    ///
    /// Returns once the publisher has registered this connection, so every
    /// message published afterwards reaches this socket.
    pub fn connect_with_config(endpoint: &Endpoint, config: SocketConfig) -> Result<Self> {
        let stream = connect_any(endpoint, config.connect_timeout)?;
        stream.set_nodelay(true)?;
        let control = stream.try_clone()?;

        let mut reader = MessageReader::with_max_message_size(stream, config.max_message_size);
        control.set_read_timeout(Some(config.connect_timeout))?;
        let greeting = reader.read_message().map_err(|err| match err {
            TransportError::Io(io)
                if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                TransportError::HandshakeFailed(format!(
                    "no greeting from {endpoint} within {:?}",
                    config.connect_timeout
                ))
            }
            other => other,
        })?;
        if greeting.as_ref() != GREETING {
            return Err(TransportError::HandshakeFailed(format!(
                "unexpected greeting from {endpoint}"
            )));
        }
        control.set_read_timeout(None)?;

        info!(%endpoint, "subscribe socket connected");

        Ok(Self {
            endpoint: endpoint.clone(),
            reader,
            control,
            subscriptions: Vec::new(),
        })
    }

    /// Start delivering messages that begin with `prefix`.
    pub fn subscribe(&mut self, prefix: impl AsRef<[u8]>) {
        let prefix = prefix.as_ref().to_vec();
        debug!(prefix = %String::from_utf8_lossy(&prefix), "subscribe");
        if !self.subscriptions.contains(&prefix) {
            self.subscriptions.push(prefix);
        }
    }

    /// Receive the next message matching a subscription (blocking).
    ///
    /// Returns `Err(TransportError::ConnectionClosed)` once the publisher has
    /// gone away.
    pub fn recv(&mut self) -> Result<Bytes> {
        loop {
            let body = self.reader.read_message()?;
            if self.matches(&body) {
                return Ok(body);
            }
            trace!(len = body.len(), "filtered message");
        }
    }

    /// Bound how long [`SubSocket::recv`] may block. `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.control.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Close the connection. Safe to call more than once.
    pub fn shutdown(&self) -> Result<()> {
        match self.control.shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotConnected => {}
            Err(err) => return Err(err.into()),
        }
        info!(endpoint = %self.endpoint, "subscribe socket closed");
        Ok(())
    }

    /// The endpoint this socket connected to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn matches(&self, body: &[u8]) -> bool {
        self.subscriptions.iter().any(|p| body.starts_with(p))
    }
}

impl std::fmt::Debug for SubSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubSocket")
            .field("endpoint", &self.endpoint)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

fn connect_any(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in endpoint.resolve()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(TransportError::Connect {
        endpoint: endpoint.to_string(),
        source: last_err
            .unwrap_or_else(|| std::io::Error::new(ErrorKind::AddrNotAvailable, "no address")),
    })
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::publisher::PubSocket;
    use crate::writer::write_message;

    fn publisher() -> PubSocket {
        PubSocket::bind(&Endpoint::new("127.0.0.1", 0)).unwrap()
    }

    #[test]
    fn receives_only_subscribed_prefixes() {
        let publisher = publisher();
        let mut sub = SubSocket::connect(publisher.endpoint()).unwrap();
        sub.subscribe("ABC ");

        publisher.send(b"ABCD skipped").unwrap();
        publisher.send(b"XYZ skipped").unwrap();
        publisher.send(b"ABC kept").unwrap();

        assert_eq!(sub.recv().unwrap().as_ref(), b"ABC kept");
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let publisher = publisher();
        let mut sub = SubSocket::connect(publisher.endpoint()).unwrap();
        sub.subscribe("");

        publisher.send(b"anything").unwrap();
        assert_eq!(sub.recv().unwrap().as_ref(), b"anything");
    }

    #[test]
    fn publisher_shutdown_ends_stream() {
        let publisher = publisher();
        let mut sub = SubSocket::connect(publisher.endpoint()).unwrap();
        sub.subscribe("");

        publisher.send(b"last").unwrap();
        publisher.shutdown();

        assert_eq!(sub.recv().unwrap().as_ref(), b"last");
        assert!(matches!(sub.recv(), Err(TransportError::ConnectionClosed)));
    }

    #[test]
    fn connect_refused_is_reported() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = SubSocket::connect(&Endpoint::new("127.0.0.1", port)).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn wrong_greeting_fails_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            write_message(&mut stream, b"HELLO/0").unwrap();
            stream
        });

        let err = SubSocket::connect(&Endpoint::new("127.0.0.1", port)).unwrap_err();
        assert!(matches!(err, TransportError::HandshakeFailed(_)));
        drop(server.join().unwrap());
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = SocketConfig {
            connect_timeout: Duration::from_millis(100),
            ..SocketConfig::default()
        };

        let err = SubSocket::connect_with_config(&Endpoint::new("127.0.0.1", port), config)
            .unwrap_err();
        assert!(matches!(err, TransportError::HandshakeFailed(_)));
        drop(listener);
    }

    #[test]
    fn read_timeout_bounds_recv() {
        let publisher = publisher();
        let mut sub = SubSocket::connect(publisher.endpoint()).unwrap();
        sub.subscribe("");
        sub.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
        assert!(matches!(sub.recv(), Err(TransportError::Io(_))));
    }
}
