//! Bridge configuration and endpoint addressing.
//!
//! All tunables live in an explicit [`BridgeConfig`] passed at open time;
//! there is no process-wide state.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use crate::error::BridgeError;

/// Default bytes per transport unit.
///
/// Matches the transport's own default payload size so a full chunk maps to
/// one packet with no internal fragmentation.
pub const DEFAULT_CHUNK_SIZE: usize = 1316;

/// Default target end-to-end latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(125);

/// Default destination port when the endpoint string omits one.
pub const DEFAULT_PORT: u16 = 9000;

/// Default network-caching value backing the presentation-delay hint.
pub const DEFAULT_NETWORK_CACHING: Duration = Duration::from_millis(1000);

/// Default capacity of the bounded egress queue, in buffers.
pub const DEFAULT_EGRESS_QUEUE_CAPACITY: usize = 256;

/// Default readability-poll interval.
///
/// Short on purpose: it bounds how long a cancellation request can go
/// unobserved while the ingest pump waits for data.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Crypto key length in bytes, restricted to what transports accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLength {
    /// 16 bytes (AES-128).
    #[default]
    Bytes16,
    /// 24 bytes (AES-192).
    Bytes24,
    /// 32 bytes (AES-256).
    Bytes32,
}

impl KeyLength {
    /// The length in bytes.
    pub fn as_bytes(self) -> usize {
        match self {
            Self::Bytes16 => 16,
            Self::Bytes24 => 24,
            Self::Bytes32 => 32,
        }
    }
}

impl TryFrom<usize> for KeyLength {
    type Error = BridgeError;

    fn try_from(bytes: usize) -> Result<Self, Self::Error> {
        match bytes {
            16 => Ok(Self::Bytes16),
            24 => Ok(Self::Bytes24),
            32 => Ok(Self::Bytes32),
            other => Err(BridgeError::Config(format!(
                "crypto key length must be 16, 24 or 32 bytes, got {other}"
            ))),
        }
    }
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Maximum bytes moved in one transport operation.
    pub chunk_size: usize,
    /// Target end-to-end delay the transport should buffer for.
    pub latency: Duration,
    /// Pre-shared key for stream encryption. `None` or empty disables it.
    pub passphrase: Option<String>,
    /// Crypto key length; only meaningful when a passphrase is set.
    pub key_length: KeyLength,
    /// Network-caching value from which the presentation-delay hint is
    /// derived.
    pub network_caching: Duration,
    /// Capacity of the egress queue in buffers. The ingest queue is
    /// unbounded.
    pub egress_queue_capacity: usize,
    /// Readability-poll interval used by the ingest pump.
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            latency: DEFAULT_LATENCY,
            passphrase: None,
            key_length: KeyLength::default(),
            network_caching: DEFAULT_NETWORK_CACHING,
            egress_queue_capacity: DEFAULT_EGRESS_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl BridgeConfig {
    /// Check the configuration for values no bridge can run with.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.chunk_size == 0 {
            return Err(BridgeError::Config("chunk-size must be non-zero".into()));
        }
        if self.egress_queue_capacity == 0 {
            return Err(BridgeError::Config(
                "egress queue capacity must be non-zero".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(BridgeError::Config(
                "poll interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The passphrase, with "empty disables encryption" applied.
    pub(crate) fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref().filter(|p| !p.is_empty())
    }
}

/// A destination endpoint: host plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or literal IP address, without brackets.
    pub host: String,
    /// Destination port.
    pub port: u16,
}

impl Endpoint {
    /// Build an endpoint from parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a `host[:port]` style endpoint string.
    ///
    /// IPv6 literals may be bracketed (`[::1]:9000`); a bare IPv6 literal
    /// without brackets is taken as host-only. A missing port defaults to
    /// [`DEFAULT_PORT`].
    pub fn parse(input: &str) -> Result<Self, BridgeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BridgeError::Config("empty endpoint address".into()));
        }

        if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                BridgeError::Config(format!("unterminated '[' in endpoint ({input})"))
            })?;
            if host.is_empty() {
                return Err(BridgeError::Config(format!(
                    "empty host in endpoint ({input})"
                )));
            }
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| {
                        BridgeError::Config(format!("invalid port in endpoint ({input})"))
                    })?,
            };
            return Ok(Self::new(host, port));
        }

        // More than one ':' without brackets: a bare IPv6 literal.
        if input.matches(':').count() > 1 {
            return Ok(Self::new(input, DEFAULT_PORT));
        }

        match input.split_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(BridgeError::Config(format!(
                        "empty host in endpoint ({input})"
                    )));
                }
                let port = port.parse().map_err(|_| {
                    BridgeError::Config(format!("invalid port in endpoint ({input})"))
                })?;
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(input, DEFAULT_PORT)),
        }
    }

    /// Resolve the endpoint to a socket address.
    pub fn resolve(&self) -> Result<SocketAddr, BridgeError> {
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| {
                BridgeError::Config(format!("cannot resolve {self} (reason: {err})"))
            })?;
        addrs
            .next()
            .ok_or_else(|| BridgeError::Config(format!("no addresses for {self}")))
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
