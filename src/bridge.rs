//! Bridge lifecycle and the blocking stream surface.
//!
//! A bridge instance owns one connection, one handoff queue, and one pump
//! thread, and exposes the strictly blocking calls the application uses:
//! `pull` on an [`IngestBridge`], `push` on an [`EgressBridge`]. Lifecycle
//! runs `Created → Connecting → Streaming → Closing → Closed`; a failure
//! while connecting releases whatever was partially acquired, in reverse
//! order, and leaves no thread running.
//!
//! Teardown order is fixed: request cancellation, close the queue (waking
//! anything blocked on it), join the pump thread, then close the transport.
//! The transport is never closed while the pump might still touch it.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::Buffer;
use crate::cancel::CancelToken;
use crate::config::{BridgeConfig, Endpoint};
use crate::error::BridgeError;
use crate::pump::{EgressPump, IngestPump};
use crate::queue::PacketQueue;
use crate::transport::{Connector, Direction, Transport, TransportOptions};

/// Lifecycle state of a bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Nothing acquired yet.
    Created,
    /// Resolving, configuring, and connecting the transport.
    Connecting,
    /// Pump thread running, stream calls live.
    Streaming,
    /// Teardown in progress.
    Closing,
    /// Fully torn down. Terminal; reconnecting needs a new instance.
    Closed,
}

/// Answers to the capability queries a host asks of a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCapabilities {
    /// The stream cannot seek.
    pub seekable: bool,
    /// Nor fast-seek.
    pub fast_seekable: bool,
    /// Nor pause.
    pub pausable: bool,
    /// The consumer does not pace delivery; the network does.
    pub paced_by_consumer: bool,
    /// How long the consumer should buffer before presenting.
    pub presentation_delay: Duration,
}

impl StreamCapabilities {
    fn live_stream(config: &BridgeConfig) -> Self {
        Self {
            seekable: false,
            fast_seekable: false,
            pausable: false,
            paced_by_consumer: false,
            presentation_delay: config.network_caching,
        }
    }
}

/// State shared by both bridge flavors: the lifecycle controller.
#[derive(Debug)]
struct Core {
    state: BridgeState,
    cancel: CancelToken,
    queue: Arc<PacketQueue>,
    transport: Arc<dyn Transport>,
    worker: Option<JoinHandle<()>>,
    capabilities: StreamCapabilities,
}

impl Core {
    fn open(
        config: &BridgeConfig,
        connector: &dyn Connector,
        endpoint: &Endpoint,
        direction: Direction,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        // Connecting: the connector owns resolve + option setup + connect,
        // and cleans up after itself on failure.
        let options = TransportOptions::from_config(config, direction);
        let transport = connector.connect(endpoint, &options)?;

        let queue = Arc::new(match direction {
            // Ingest must never stall the network on a slow consumer.
            Direction::Ingest => PacketQueue::unbounded(),
            // Egress bounds the queue so push exerts backpressure.
            Direction::Egress => PacketQueue::bounded(config.egress_queue_capacity),
        });
        let cancel = CancelToken::new();

        let spawned = {
            let transport = Arc::clone(&transport);
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            let chunk_size = config.chunk_size;
            let poll_interval = config.poll_interval;
            let name = match direction {
                Direction::Ingest => "pktbridge-ingest",
                Direction::Egress => "pktbridge-egress",
            };
            thread::Builder::new().name(name.into()).spawn(move || {
                match direction {
                    Direction::Ingest => {
                        IngestPump::new(transport, queue, chunk_size, poll_interval, cancel).run()
                    }
                    Direction::Egress => {
                        EgressPump::new(transport, queue, chunk_size, cancel).run()
                    }
                }
            })
        };

        let worker = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                // Reverse-acquisition order: the queue goes first (dropped
                // with Core never built), the transport handle last.
                transport.close();
                return Err(BridgeError::Resource(format!(
                    "failed to spawn pump thread: {err}"
                )));
            }
        };

        Ok(Self {
            state: BridgeState::Streaming,
            cancel,
            queue,
            transport,
            worker: Some(worker),
            capabilities: StreamCapabilities::live_stream(config),
        })
    }

    /// Tear the bridge down. Idempotent.
    fn shutdown(&mut self) {
        if matches!(self.state, BridgeState::Closing | BridgeState::Closed) {
            return;
        }
        self.state = BridgeState::Closing;
        tracing::debug!("closing bridge");

        self.cancel.cancel();
        // Wakes a pump blocked in dequeue and a consumer blocked in pull.
        self.queue.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("pump thread panicked during shutdown");
            }
        }
        // Safe now: the pump thread is gone.
        self.transport.close();
        self.state = BridgeState::Closed;
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A network-to-application bridge: blocking `pull` of received packets.
#[derive(Debug)]
pub struct IngestBridge {
    core: Core,
    eof: bool,
    /// Partially consumed buffer carried between `Read::read` calls.
    pending: Option<Buffer>,
}

impl IngestBridge {
    /// Connect and start the ingest pump thread.
    pub fn open(
        config: &BridgeConfig,
        connector: &dyn Connector,
        endpoint: &Endpoint,
    ) -> Result<Self, BridgeError> {
        let core = Core::open(config, connector, endpoint, Direction::Ingest)?;
        Ok(Self {
            core,
            eof: false,
            pending: None,
        })
    }

    /// Block until the next received packet is available.
    ///
    /// Returns `None` exactly when the stream has ended: the transport
    /// closed or failed and everything already received has been drained.
    /// Once `None` has been returned the stream stays ended.
    pub fn pull(&mut self) -> Option<Buffer> {
        if self.eof {
            return None;
        }
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        match self.core.queue.dequeue() {
            Some(buffer) => Some(buffer),
            None => {
                self.eof = true;
                None
            }
        }
    }

    /// What this stream can and cannot do.
    pub fn capabilities(&self) -> StreamCapabilities {
        self.core.capabilities
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.core.state
    }

    /// Tear the bridge down. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        self.core.shutdown();
    }
}

impl Read for IngestBridge {
    /// Blocking byte-stream view over `pull`. Packet boundaries are not
    /// preserved; end of stream reads as `Ok(0)`.
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let mut buffer = loop {
            match self.pull() {
                None => return Ok(0),
                Some(buffer) if buffer.is_drained() => continue,
                Some(buffer) => break buffer,
            }
        };
        let len = out.len().min(buffer.remaining());
        out[..len].copy_from_slice(&buffer.bytes()[..len]);
        buffer.advance(len);
        if !buffer.is_drained() {
            self.pending = Some(buffer);
        }
        Ok(len)
    }
}

/// An application-to-network bridge: `push` hands buffers to the egress
/// pump.
#[derive(Debug)]
pub struct EgressBridge {
    core: Core,
}

impl EgressBridge {
    /// Connect and start the egress pump thread.
    pub fn open(
        config: &BridgeConfig,
        connector: &dyn Connector,
        endpoint: &Endpoint,
    ) -> Result<Self, BridgeError> {
        let core = Core::open(config, connector, endpoint, Direction::Egress)?;
        Ok(Self { core })
    }

    /// Hand a sequence of buffers to the egress pump, preserving order.
    ///
    /// Returns the total bytes accepted into the queue. This is a hand-off
    /// guarantee, not a delivery guarantee: the pump transmits them
    /// best-effort in the background. Blocks while the queue is at capacity
    /// (backpressure); stops early, returning the count so far, if the
    /// bridge has been closed.
    pub fn push<I>(&self, buffers: I) -> usize
    where
        I: IntoIterator<Item = Buffer>,
    {
        let mut accepted = 0;
        for buffer in buffers {
            let len = buffer.remaining();
            if self.core.queue.enqueue(buffer).is_err() {
                break;
            }
            accepted += len;
        }
        accepted
    }

    /// What this stream can and cannot do.
    pub fn capabilities(&self) -> StreamCapabilities {
        self.core.capabilities
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.core.state
    }

    /// Tear the bridge down. Idempotent; also runs on drop.
    ///
    /// Buffers still queued or mid-send are dropped best-effort, matching
    /// the egress error policy.
    pub fn close(&mut self) {
        self.core.shutdown();
    }
}

impl Write for EgressBridge {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let accepted = self.push([Buffer::from(data)]);
        if accepted == 0 {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "bridge is closed",
            ));
        }
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Hand-off only: there is no way to wait for the pump to drain.
        Ok(())
    }
}
