//! # pktbridge
//!
//! A bidirectional bridge between a packet-oriented, congestion-controlled
//! network transport and a host application that consumes or produces data
//! through a strictly blocking, call-driven interface.
//!
//! The transport side is event-driven and moves data at its own pace; the
//! application side makes one logical `pull` or `push` call at a time. The
//! bridge reconciles the two with a pump thread per direction and a
//! closeable handoff queue between them:
//!
//! ```text
//! ingest:  Transport ──packet──▶ IngestPump ──enqueue──▶ Queue ──pull──▶ app
//! egress:  app ──push──▶ Queue ──dequeue──▶ EgressPump ──chunked send──▶ Transport
//! ```
//!
//! Teardown is safe from either side: cancelling the bridge wakes whatever
//! is blocked, the pump thread is joined before the transport handle is
//! closed, and a consumer blocked in `pull` observes end-of-stream instead
//! of hanging.
//!
//! ## Modules
//!
//! - [`bridge`]: lifecycle controller plus the blocking stream surface
//!   ([`IngestBridge`](bridge::IngestBridge),
//!   [`EgressBridge`](bridge::EgressBridge))
//! - [`pump`]: the per-direction background workers
//! - [`queue`]: the closeable FIFO handoff
//! - [`transport`]: the opaque transport boundary and a UDP instantiation
//! - [`buffer`], [`cancel`], [`config`], [`error`]: supporting types
//!
//! ## Example
//!
//! ```no_run
//! use pktbridge::prelude::*;
//!
//! fn main() -> Result<(), BridgeError> {
//!     let config = BridgeConfig::default();
//!     let endpoint = Endpoint::parse("203.0.113.7:9000")?;
//!     let mut bridge = IngestBridge::open(&config, &UdpConnector, &endpoint)?;
//!
//!     while let Some(packet) = bridge.pull() {
//!         println!("received {} bytes", packet.remaining());
//!     }
//!     // EOF: the connection ended.
//!     bridge.close();
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod buffer;
pub mod cancel;
pub mod config;
pub mod error;
pub mod pump;
pub mod queue;
pub mod transport;

/// Common imports for bridge users.
pub mod prelude {
    pub use crate::bridge::{BridgeState, EgressBridge, IngestBridge, StreamCapabilities};
    pub use crate::buffer::Buffer;
    pub use crate::config::{BridgeConfig, Endpoint, KeyLength};
    pub use crate::error::{BridgeError, TransportError, TransportErrorKind};
    pub use crate::transport::udp::UdpConnector;
    pub use crate::transport::{Connector, Direction, Transport, TransportOptions};
}
