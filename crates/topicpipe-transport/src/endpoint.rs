use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{Result, TransportError};

/// Host wildcard meaning "all interfaces" when binding.
pub const WILDCARD_HOST: &str = "*";

const SCHEME: &str = "tcp://";

/// A `tcp://<host>:<port>` transport address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host part as given (may be `*`).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns true if the host is the bind-all wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.host == WILDCARD_HOST
    }

    /// Resolve to socket addresses, mapping `*` to the IPv4 unspecified address.
    pub fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let host = if self.is_wildcard() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        let addrs: Vec<SocketAddr> = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::InvalidAddress {
                endpoint: self.to_string(),
                reason: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::InvalidAddress {
                endpoint: self.to_string(),
                reason: "host resolved to no addresses".to_string(),
            });
        }
        Ok(addrs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{SCHEME}[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{SCHEME}{}:{}", self.host, self.port)
        }
    }
}
