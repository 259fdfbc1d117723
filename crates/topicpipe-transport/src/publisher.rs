use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, info, warn};

use crate::codec::{encode_message, SocketConfig, GREETING};
use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::writer::{write_encoded, write_message};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);
const SUBSCRIBER_POLL: Duration = Duration::from_millis(5);

struct Subscriber {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
}

type SubscriberList = Arc<Mutex<Vec<Subscriber>>>;

/// Publishing side of the pub/sub transport.
///
/// Binds a TCP listener and fans every published message out to all connected
/// subscribers. Delivery is best-effort: messages published while nobody is
/// connected are dropped, and a subscriber whose connection fails is removed.
/// Topic filtering happens on the subscriber side.
pub struct PubSocket {
    endpoint: Endpoint,
    local_addr: SocketAddr,
    subscribers: SubscriberList,
    shutdown: Arc<AtomicBool>,
    acceptor: Mutex<Option<JoinHandle<()>>>,
    config: SocketConfig,
}

impl PubSocket {
    /// Bind a publish socket with default configuration.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        Self::bind_with_config(endpoint, SocketConfig::default())
    }

    /// Bind a publish socket with explicit configuration.
    ///
    /// Port `0` binds an ephemeral port; [`PubSocket::endpoint`] reports the
    /// port actually assigned.
    pub fn bind_with_config(endpoint: &Endpoint, config: SocketConfig) -> Result<Self> {
        let addrs = endpoint.resolve()?;
        let listener = TcpListener::bind(&addrs[..]).map_err(|e| TransportError::Bind {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;
        let endpoint = Endpoint::new(endpoint.host(), local_addr.port());

        let subscribers: SubscriberList = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let acceptor = {
            let subscribers = Arc::clone(&subscribers);
            let shutdown = Arc::clone(&shutdown);
            let config = config.clone();
            thread::Builder::new()
                .name(format!("topicpipe-accept-{}", local_addr.port()))
                .spawn(move || accept_loop(listener, subscribers, shutdown, config))?
        };

        info!(%endpoint, "publish socket bound");

        Ok(Self {
            endpoint,
            local_addr,
            subscribers,
            shutdown,
            acceptor: Mutex::new(Some(acceptor)),
            config,
        })
    }

    /// Publish one message body to every connected subscriber.
    ///
    /// Returns the body length. Subscribers whose connection fails are
    /// dropped; that is not an error for the publisher.
    pub fn send(&self, body: &[u8]) -> Result<usize> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        if body.len() > self.config.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: body.len(),
                max: self.config.max_message_size,
            });
        }

        let mut wire = BytesMut::new();
        encode_message(body, &mut wire)?;

        let mut subscribers = lock(&self.subscribers);
        subscribers.retain_mut(|sub| match write_encoded(&mut sub.stream, &wire) {
            Ok(()) => true,
            Err(err) => {
                debug!(id = sub.id, peer = %sub.peer, error = %err, "dropping subscriber");
                false
            }
        });

        Ok(body.len())
    }

    /// Number of currently registered subscriber connections.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Block until at least `count` subscribers are connected or `timeout`
    /// elapses. Returns whether the count was reached.
    pub fn wait_for_subscribers(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.subscriber_count() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(SUBSCRIBER_POLL);
        }
    }

    /// Stop accepting subscribers and close every subscriber connection.
    ///
    /// Idempotent. Messages already written are still delivered; the
    /// subscriber sees a clean end of stream afterwards.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        let handle = self
            .acceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // The acceptor is parked in accept(); a throwaway connection wakes it.
            match TcpStream::connect(wake_addr(self.local_addr)) {
                Ok(_) => {
                    if handle.join().is_err() {
                        warn!(endpoint = %self.endpoint, "acceptor thread panicked");
                    }
                }
                Err(err) => {
                    warn!(endpoint = %self.endpoint, error = %err, "could not wake acceptor; detaching it");
                }
            }
        }

        let mut subscribers = lock(&self.subscribers);
        for sub in subscribers.drain(..) {
            let _ = sub.stream.shutdown(std::net::Shutdown::Both);
        }

        info!(endpoint = %self.endpoint, "publish socket closed");
    }

    /// The bound endpoint (host as requested, port as assigned).
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The local socket address of the listener.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for PubSocket {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PubSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSocket")
            .field("endpoint", &self.endpoint)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn accept_loop(
    listener: TcpListener,
    subscribers: SubscriberList,
    shutdown: Arc<AtomicBool>,
    config: SocketConfig,
) {
    let mut next_id = 1u64;
    for conn in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let stream = match conn {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %TransportError::Accept(err), "accept failed");
                thread::sleep(ACCEPT_BACKOFF);
                continue;
            }
        };

        let id = next_id;
        next_id += 1;
        if let Err(err) = register(stream, id, &subscribers, &config) {
            debug!(id, error = %err, "subscriber registration failed");
        }
    }
}

fn register(
    mut stream: TcpStream,
    id: u64,
    subscribers: &SubscriberList,
    config: &SocketConfig,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    stream.set_nodelay(true)?;
    stream.set_write_timeout(config.write_timeout)?;

    // Greeting and registration happen under one lock so the greeting is
    // always the first message a subscriber sees.
    let mut subscribers = lock(subscribers);
    write_message(&mut stream, GREETING)?;
    subscribers.push(Subscriber { id, peer, stream });
    debug!(id, %peer, total = subscribers.len(), "subscriber connected");
    Ok(())
}

fn wake_addr(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
