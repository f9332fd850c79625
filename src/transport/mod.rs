//! The opaque transport boundary.
//!
//! The bridge does not implement a wire protocol. It treats the network side
//! as a socket-like primitive behind the [`Transport`] trait and leaves
//! handshake, congestion control, and retransmission to whatever library
//! implements it. [`Connector`] bundles endpoint resolution, option setup,
//! and the connect attempt into one step, so the lifecycle controller never
//! touches a half-configured handle.
//!
//! [`udp::UdpConnector`] ships as a plain-datagram instantiation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BridgeConfig, Endpoint, KeyLength};
use crate::error::TransportError;

pub mod udp;

#[cfg(test)]
pub(crate) mod mock;

/// Which way a bridge instance moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Network to application.
    Ingest,
    /// Application to network. Connectors set the sender role on the
    /// transport for this direction.
    Egress,
}

/// Pre-shared key material for transports that encrypt.
#[derive(Clone)]
pub struct Passphrase {
    secret: String,
    key_length: KeyLength,
}

impl Passphrase {
    /// Build key material. Returns `None` for an empty secret, which means
    /// encryption is disabled.
    pub fn new(secret: impl Into<String>, key_length: KeyLength) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return None;
        }
        Some(Self { secret, key_length })
    }

    /// The pre-shared secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The crypto key length to derive from the secret.
    pub fn key_length(&self) -> KeyLength {
        self.key_length
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase")
            .field("secret", &"<redacted>")
            .field("key_length", &self.key_length)
            .finish()
    }
}

/// Options applied to a transport handle before connecting.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Role of this end of the connection.
    pub direction: Direction,
    /// Target end-to-end delay the transport should buffer for.
    pub latency: Duration,
    /// Deliver packets on the sender's timing rather than as fast as
    /// possible.
    pub timestamped_delivery: bool,
    /// Optional stream encryption key material.
    pub passphrase: Option<Passphrase>,
}

impl TransportOptions {
    /// Derive transport options from a bridge configuration.
    pub fn from_config(config: &BridgeConfig, direction: Direction) -> Self {
        Self {
            direction,
            latency: config.latency,
            timestamped_delivery: true,
            passphrase: config
                .passphrase()
                .and_then(|secret| Passphrase::new(secret, config.key_length)),
        }
    }
}

/// A connected, packet-oriented transport handle.
///
/// The pump thread is the only user of the data-transfer methods while the
/// bridge is streaming; the lifecycle controller calls `close` only after
/// the pump thread has been joined.
pub trait Transport: std::fmt::Debug + Send + Sync {
    /// Wait up to `timeout` for the transport to become readable.
    ///
    /// The timeout exists to bound cancellation latency, not to signal an
    /// error; `Ok(false)` just means "nothing yet".
    fn poll_readable(&self, timeout: Duration) -> Result<bool, TransportError>;

    /// Receive one packet into `buf`, returning the byte count delivered.
    fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Send `data`, returning the byte count accepted. Partial sends are
    /// routine; the caller advances and retries.
    fn send(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Close the handle. Idempotent; later operations fail with a
    /// [`closed`](TransportError::closed) error.
    fn close(&self);
}

/// Opens connected [`Transport`] handles.
pub trait Connector {
    /// Resolve `endpoint`, apply `options`, and connect.
    ///
    /// On failure the connector releases everything it acquired; no handle
    /// leaks.
    fn connect(
        &self,
        endpoint: &Endpoint,
        options: &TransportOptions,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}
