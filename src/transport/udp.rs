//! Plain-datagram transport over a blocking UDP socket.
//!
//! This is the reference instantiation of the [`Transport`] boundary: one
//! datagram per `receive`/`send`, readability polling via the socket read
//! timeout. Plain UDP has no latency or delivery-timing knobs, so those
//! options are accepted as hints and ignored; a passphrase is rejected
//! rather than silently sending cleartext.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Connector, Transport, TransportOptions};
use crate::config::Endpoint;
use crate::error::TransportError;

/// Opens [`UdpTransport`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl Connector for UdpConnector {
    fn connect(
        &self,
        endpoint: &Endpoint,
        options: &TransportOptions,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        if options.passphrase.is_some() {
            return Err(TransportError::unsupported(
                "the datagram transport does not implement stream encryption",
            ));
        }
        let addr = endpoint
            .resolve()
            .map_err(|err| TransportError::connect(err.to_string()))?;
        Ok(Arc::new(UdpTransport::connect(addr)?))
    }
}

/// A connected UDP socket behind the [`Transport`] trait.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    closed: AtomicBool,
}

impl UdpTransport {
    /// Bind an ephemeral local socket and connect it to `addr`.
    pub fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            "0.0.0.0:0".parse().map_err(to_connect_error)?
        } else {
            "[::]:0".parse().map_err(to_connect_error)?
        };
        let socket = UdpSocket::bind(bind_addr).map_err(to_connect_error)?;
        socket.connect(addr).map_err(to_connect_error)?;
        Ok(Self {
            socket,
            closed: AtomicBool::new(false),
        })
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(|err| TransportError::connect(err.to_string()))
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::closed());
        }
        Ok(())
    }
}

fn to_connect_error(err: impl ToString) -> TransportError {
    TransportError::connect(err.to_string())
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

impl Transport for UdpTransport {
    fn poll_readable(&self, timeout: Duration) -> Result<bool, TransportError> {
        self.ensure_open()?;
        // set_read_timeout rejects a zero duration.
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket
            .set_read_timeout(Some(timeout))
            .map_err(|err| TransportError::poll(err.to_string()))?;

        let mut probe = [0u8; 1];
        match self.socket.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(err) if is_timeout(&err) => Ok(false),
            Err(err) => Err(TransportError::poll(err.to_string())),
        }
    }

    fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.ensure_open()?;
        match self.socket.recv(buf) {
            Ok(len) => Ok(len),
            // Raced with another reader; report an empty delivery.
            Err(err) if is_timeout(&err) => Ok(0),
            Err(err) => Err(TransportError::receive(err.to_string())),
        }
    }

    fn send(&self, data: &[u8]) -> Result<usize, TransportError> {
        self.ensure_open()?;
        self.socket
            .send(data)
            .map_err(|err| TransportError::send(err.to_string()))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
