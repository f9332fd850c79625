//! Error types for the bridge.

use std::fmt;

use thiserror::Error;

/// What a transport operation was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Endpoint resolution, socket setup, or the connect itself failed.
    Connect,
    /// The readability poll failed; the connection is presumed dead.
    Poll,
    /// Receiving a packet failed; the connection is presumed dead.
    Receive,
    /// Sending a chunk failed. Transient on the egress path: only the
    /// current buffer's remainder is dropped.
    Send,
    /// The operation was attempted on a closed transport handle.
    Closed,
    /// A requested option is not supported by this transport.
    Unsupported,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Poll => "poll",
            Self::Receive => "receive",
            Self::Send => "send",
            Self::Closed => "closed",
            Self::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// A transport failure: a structured kind plus a human-readable detail.
///
/// Replaces the two-step "error code, then ask for the last error string"
/// protocol of C transport libraries with a single value.
#[derive(Debug, Clone, Error)]
#[error("transport {kind} error: {detail}")]
pub struct TransportError {
    kind: TransportErrorKind,
    detail: String,
}

impl TransportError {
    /// Build an error from a kind and detail text.
    pub fn new(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Connection setup failure.
    pub fn connect(detail: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, detail)
    }

    /// Readability poll failure.
    pub fn poll(detail: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Poll, detail)
    }

    /// Packet receive failure.
    pub fn receive(detail: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Receive, detail)
    }

    /// Chunk send failure.
    pub fn send(detail: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Send, detail)
    }

    /// Operation on a closed handle.
    pub fn closed() -> Self {
        Self::new(TransportErrorKind::Closed, "transport handle is closed")
    }

    /// Unsupported transport option.
    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unsupported, detail)
    }

    /// The structured failure kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The human-readable detail text.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Top-level bridge errors, surfaced synchronously from `open`.
///
/// Mid-stream transport failures are not surfaced here; the application
/// observes them as end-of-stream (ingest) or best-effort drops (egress).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid configuration, including an unparseable or unresolvable
    /// endpoint. No thread has been started.
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue, buffer, or thread allocation failed. Partially acquired
    /// resources have been released in reverse-acquisition order.
    #[error("resource error: {0}")]
    Resource(String),

    /// The transport failed to open or connect.
    #[error("failed to open/connect: {0}")]
    Transport(#[from] TransportError),
}
