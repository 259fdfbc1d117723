use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use topicpipe_frame::{decode_frame, encode_frame, Frame, FrameKind, Topics};
use topicpipe_transport::{Endpoint, PubSocket, SubSocket, TransportError};
use tracing::{debug, info, trace, warn};

use crate::codec::{Codec, DefaultCodec};
use crate::config::ChannelConfig;
use crate::direction::Direction;
use crate::error::{ChannelError, Result};
use crate::name::resolve_name;

enum Socket {
    Publisher(PubSocket),
    Subscriber(SubSocket),
}

/// Outcome of [`Channel::receive_with_eof`].
#[derive(Debug, Clone, PartialEq)]
pub enum Received<T> {
    Value(T),
    /// The publisher closed the stream. The receiving channel is now closed.
    EndOfStream,
}

impl<T> Received<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Received::Value(value) => Some(value),
            Received::EndOfStream => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Received::EndOfStream)
    }
}

/// A named, one-way stream of values over pub/sub.
///
/// An outgoing channel binds and publishes every value under its name; on
/// close it publishes an empty frame under `name!` to tell subscribers the
/// stream is over. An incoming channel connects, subscribes to both topics,
/// and closes itself when it sees that frame.
///
/// States are `Open` and `Closed`; `Closed` is terminal. The socket is
/// released exactly once, by [`Channel::close`], by end-of-stream, or on drop.
pub struct Channel<C = DefaultCodec> {
    name: String,
    direction: Direction,
    host: String,
    port: u16,
    topics: Topics,
    socket: Socket,
    codec: C,
    closed: AtomicBool,
}

impl Channel<DefaultCodec> {
    /// Open a channel with the default codec.
    ///
    /// `name` is generated when `None`; `host` defaults to `*` for outgoing
    /// and `localhost` for incoming channels.
    pub fn open(
        direction: Direction,
        name: Option<&str>,
        host: Option<&str>,
        port: u16,
    ) -> Result<Self> {
        let mut config = ChannelConfig::new(direction).with_port(port);
        config.name = name.map(str::to_string);
        config.host = host.map(str::to_string);
        Self::open_with_config(config)
    }

    /// Open a channel from a config with the default codec.
    pub fn open_with_config(config: ChannelConfig) -> Result<Self> {
        Self::open_with_codec(config, DefaultCodec::default())
    }

    /// Open a channel, run `f`, and close the channel on every exit path.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<R>(config: ChannelConfig, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mut channel = Self::open_with_config(config)?;
        let result = f(&mut channel);
        let closed = channel.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl<C: Codec> Channel<C> {
    /// Open a channel with an explicit codec.
    ///
    /// The name is validated before any socket is created. Outgoing channels
    /// bind; incoming channels connect and subscribe to the data and
    /// end-of-stream topics.
    pub fn open_with_codec(config: ChannelConfig, codec: C) -> Result<Self> {
        let name = resolve_name(config.name.as_deref(), &mut rand::thread_rng())?;
        let topics = Topics::for_name(&name);
        let host = config.resolved_host().to_string();
        let endpoint = Endpoint::new(host.as_str(), config.port);

        let (socket, port) = match config.direction {
            Direction::Outgoing => {
                let publisher = PubSocket::bind_with_config(&endpoint, config.socket)?;
                let port = publisher.endpoint().port();
                (Socket::Publisher(publisher), port)
            }
            Direction::Incoming => {
                let mut subscriber = SubSocket::connect_with_config(&endpoint, config.socket)?;
                subscriber.subscribe(topics.data_prefix());
                subscriber.subscribe(topics.eof_prefix());
                (Socket::Subscriber(subscriber), config.port)
            }
        };

        info!(%name, direction = %config.direction, %host, port, "channel opened");

        Ok(Self {
            name,
            direction: config.direction,
            host,
            port,
            topics,
            socket,
            codec,
            closed: AtomicBool::new(false),
        })
    }

    /// Encode `value` and publish it under the data topic.
    ///
    /// Returns the size in bytes of the published frame.
    pub fn send<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<usize> {
        self.ensure_open()?;
        let Socket::Publisher(publisher) = &self.socket else {
            return Err(self.wrong_direction("send"));
        };

        let payload = self.codec.encode(value)?;
        let mut wire = BytesMut::with_capacity(self.topics.data().len() + 1 + payload.len());
        encode_frame(self.topics.data(), &payload, &mut wire)?;
        let sent = publisher.send(&wire)?;
        trace!(name = %self.name, bytes = sent, "sent frame");
        Ok(sent)
    }

    /// Receive the next value, blocking until one arrives.
    ///
    /// Returns `Ok(None)` on end-of-stream; use [`Channel::receive_with_eof`]
    /// or [`Channel::iter`] to tell that apart from a decoded null value.
    pub fn receive<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        self.receive_with_eof().map(Received::into_value)
    }

    /// Receive the next value or the end-of-stream signal.
    ///
    /// On end-of-stream the channel closes itself. A payload that fails to
    /// decode is reported as a codec error and the channel stays open.
    pub fn receive_with_eof<T: DeserializeOwned>(&mut self) -> Result<Received<T>> {
        loop {
            let frame = self.next_frame()?;
            match self.topics.classify(&frame) {
                FrameKind::EndOfStream => {
                    debug!(name = %self.name, "end of stream received");
                    if let Err(err) = self.close() {
                        warn!(
                            name = %self.name,
                            error = %err,
                            "error closing channel at end of stream"
                        );
                    }
                    return Ok(Received::EndOfStream);
                }
                FrameKind::Data => return Ok(Received::Value(self.codec.decode(&frame.payload)?)),
                FrameKind::Foreign => {
                    trace!(name = %self.name, topic = %frame.topic, "ignoring foreign topic");
                }
            }
        }
    }

    /// Lazily yield received values until end-of-stream.
    ///
    /// Not restartable: once the stream has ended the channel is closed and
    /// any further iteration yields nothing.
    pub fn iter<T: DeserializeOwned>(&mut self) -> Values<'_, T, C> {
        Values {
            channel: self,
            done: false,
            _marker: PhantomData,
        }
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.ensure_open()?;
        let direction = self.direction;
        let Socket::Subscriber(subscriber) = &mut self.socket else {
            return Err(ChannelError::WrongDirection {
                operation: "receive",
                direction,
            });
        };
        let message = subscriber.recv()?;
        Ok(decode_frame(message)?)
    }
}

impl<C> Channel<C> {
    /// Close the channel. Idempotent.
    ///
    /// An outgoing channel publishes the end-of-stream frame first. The
    /// socket is released even if that publish fails.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = match &self.socket {
            Socket::Publisher(publisher) => {
                let mut wire = BytesMut::with_capacity(self.topics.eof().len() + 1);
                let sent = encode_frame(self.topics.eof(), &[], &mut wire)
                    .map_err(ChannelError::from)
                    .and_then(|()| publisher.send(&wire).map_err(ChannelError::from));
                publisher.shutdown();
                sent.map(|_| ())
            }
            Socket::Subscriber(subscriber) => subscriber.shutdown().map_err(ChannelError::from),
        };

        info!(name = %self.name, direction = %self.direction, "channel closed");
        result
    }

    /// Block until `count` subscribers are connected or `timeout` elapses.
    ///
    /// Outgoing channels only. Returns whether the count was reached.
    pub fn wait_for_subscribers(&self, count: usize, timeout: Duration) -> Result<bool> {
        self.ensure_open()?;
        match &self.socket {
            Socket::Publisher(publisher) => Ok(publisher.wait_for_subscribers(count, timeout)),
            Socket::Subscriber(_) => Err(self.wrong_direction("wait_for_subscribers")),
        }
    }

    /// Bound how long a receive may block; `None` blocks forever.
    ///
    /// Incoming channels only. A receive that times out fails with a
    /// transport I/O error and leaves the channel open.
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.ensure_open()?;
        match &self.socket {
            Socket::Subscriber(subscriber) => Ok(subscriber.set_read_timeout(timeout)?),
            Socket::Publisher(_) => Err(self.wrong_direction("set_receive_timeout")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port bound or connected to. For an outgoing channel opened on port
    /// `0` this is the assigned port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data_topic(&self) -> &str {
        self.topics.data()
    }

    pub fn eof_topic(&self) -> &str {
        self.topics.eof()
    }

    /// `tcp://host:port` of this channel.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.as_str(), self.port)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(ChannelError::Closed)
        } else {
            Ok(())
        }
    }

    fn wrong_direction(&self, operation: &'static str) -> ChannelError {
        ChannelError::WrongDirection {
            operation,
            direction: self.direction,
        }
    }
}

impl<C> Drop for Channel<C> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(name = %self.name, error = %err, "error closing channel on drop");
        }
    }
}

impl<C> fmt::Display for Channel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Channel(name=\"{}\", direction={}, host=\"{}\", port={})",
            self.name, self.direction, self.host, self.port
        )
    }
}

impl<C> fmt::Debug for Channel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Iterator over the values of an incoming channel. See [`Channel::iter`].
///
/// Codec and frame errors are yielded and iteration continues with the next
/// frame. A transport error is yielded once and ends the iteration, since the
/// connection cannot recover.
pub struct Values<'a, T, C = DefaultCodec> {
    channel: &'a mut Channel<C>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned, C: Codec> Iterator for Values<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.channel.is_closed() {
            return None;
        }
        match self.channel.receive_with_eof() {
            Ok(Received::Value(value)) => Some(Ok(value)),
            Ok(Received::EndOfStream) => {
                self.done = true;
                None
            }
            Err(err @ ChannelError::Transport(_)) => {
                self.done = true;
                Some(Err(err))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T: DeserializeOwned, C: Codec> FusedIterator for Values<'_, T, C> {}

impl<'a, C: Codec> IntoIterator for &'a mut Channel<C> {
    type Item = Result<serde_json::Value>;
    type IntoIter = Values<'a, serde_json::Value, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Transport errors that only mean "the publisher went away".
pub fn is_disconnect(err: &ChannelError) -> bool {
    matches!(
        err,
        ChannelError::Transport(TransportError::ConnectionClosed)
    )
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn pair(name: &str) -> (Channel, Channel) {
        let outgoing = Channel::open_with_config(
            ChannelConfig::outgoing()
                .with_name(name)
                .with_host("127.0.0.1")
                .with_port(0),
        )
        .unwrap();
        let incoming = Channel::open_with_config(
            ChannelConfig::incoming()
                .with_name(name)
                .with_host("127.0.0.1")
                .with_port(outgoing.port()),
        )
        .unwrap();
        (outgoing, incoming)
    }

    #[test]
    fn round_trip_single_value() {
        let (mut out, mut inc) = pair("RT");
        let sent = out.send(&json!({"k": [1, 2]})).unwrap();
        assert!(sent > "RT ".len());
        let got: Option<Value> = inc.receive().unwrap();
        assert_eq!(got, Some(json!({"k": [1, 2]})));
    }

    #[test]
    fn topics_and_display() {
        let (out, inc) = pair("SHOW");
        assert_eq!(out.data_topic(), "SHOW");
        assert_eq!(out.eof_topic(), "SHOW!");
        assert_eq!(
            out.to_string(),
            format!(
                "Channel(name=\"SHOW\", direction=OUTGOING, host=\"127.0.0.1\", port={})",
                out.port()
            )
        );
        assert_eq!(inc.direction(), Direction::Incoming);
        assert_eq!(inc.endpoint().to_string(), format!("tcp://127.0.0.1:{}", out.port()));
    }

    #[test]
    fn eof_closes_incoming() {
        let (out, mut inc) = pair("EOF");
        out.close().unwrap();
        assert_eq!(
            inc.receive_with_eof::<Value>().unwrap(),
            Received::EndOfStream
        );
        assert!(inc.is_closed());
        assert!(matches!(inc.receive::<Value>(), Err(ChannelError::Closed)));
    }

    #[test]
    fn plain_receive_reports_eof_as_none() {
        let (out, mut inc) = pair("NONE");
        out.close().unwrap();
        assert_eq!(inc.receive::<Value>().unwrap(), None);
    }

    #[test]
    fn wrong_direction_is_rejected() {
        let (mut out, mut inc) = pair("DIR");
        assert!(matches!(
            inc.send(&1),
            Err(ChannelError::WrongDirection {
                operation: "send",
                direction: Direction::Incoming
            })
        ));
        assert!(matches!(
            out.receive::<Value>(),
            Err(ChannelError::WrongDirection {
                operation: "receive",
                ..
            })
        ));
        assert!(inc.wait_for_subscribers(1, Duration::ZERO).is_err());
        assert!(out.set_receive_timeout(None).is_err());
        assert!(!out.is_closed());
        assert!(!inc.is_closed());
    }

    #[test]
    fn waits_for_subscribers() {
        let (out, _inc) = pair("WAIT");
        assert!(out.wait_for_subscribers(1, Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn drop_publishes_end_of_stream() {
        let (out, mut inc) = pair("DROP");
        drop(out);
        assert!(inc.receive_with_eof::<Value>().unwrap().is_end_of_stream());
    }

    #[test]
    fn scoped_closes_on_error() {
        let config = ChannelConfig::outgoing()
            .with_name("SCOPE")
            .with_host("127.0.0.1")
            .with_port(0);
        let mut port = 0;
        let result: Result<()> = Channel::scoped(config, |channel| {
            port = channel.port();
            Err(ChannelError::Configuration("bail".to_string()))
        });
        assert!(matches!(result, Err(ChannelError::Configuration(_))));

        // The port was released, so it can be bound again.
        let rebound = Channel::open(Direction::Outgoing, Some("SCOPE"), Some("127.0.0.1"), port);
        assert!(rebound.is_ok());
    }

    #[test]
    fn disconnect_classification() {
        assert!(is_disconnect(&ChannelError::Transport(
            TransportError::ConnectionClosed
        )));
        assert!(!is_disconnect(&ChannelError::Closed));
    }
}
