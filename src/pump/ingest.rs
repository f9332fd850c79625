//! Network-to-application pump.

use std::sync::Arc;
use std::time::Duration;

use crate::buffer::Buffer;
use crate::cancel::CancelToken;
use crate::queue::PacketQueue;
use crate::transport::Transport;

/// Receives one packet per iteration and enqueues it for the consumer.
///
/// Transport errors are terminal for the pump: poll or receive failure ends
/// the loop, and the queue is closed so the consumer sees EOF. There is no
/// retry at this layer; reconnect policy belongs to the caller.
pub struct IngestPump {
    transport: Arc<dyn Transport>,
    queue: Arc<PacketQueue>,
    chunk_size: usize,
    poll_interval: Duration,
    cancel: CancelToken,
}

impl IngestPump {
    /// Assemble a pump. `run` is expected to be called on a dedicated
    /// thread.
    pub fn new(
        transport: Arc<dyn Transport>,
        queue: Arc<PacketQueue>,
        chunk_size: usize,
        poll_interval: Duration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            transport,
            queue,
            chunk_size,
            poll_interval,
            cancel,
        }
    }

    /// The pump loop. Returns when cancelled, on transport failure, or when
    /// the queue is closed underneath it; always closes the queue on exit.
    pub fn run(self) {
        while !self.cancel.is_cancelled() {
            let readable = match self.transport.poll_readable(self.poll_interval) {
                Ok(readable) => readable,
                Err(err) => {
                    tracing::error!(%err, "readability poll failed, stopping ingest");
                    break;
                }
            };
            if !readable {
                continue;
            }

            let mut chunk = vec![0u8; self.chunk_size];
            let received = match self.transport.receive(&mut chunk) {
                Ok(received) => received,
                Err(err) => {
                    tracing::error!(%err, "failed to receive packet, stopping ingest");
                    break;
                }
            };

            // The buffer's logical length is whatever the receive reported.
            chunk.truncate(received);
            if self.queue.enqueue(Buffer::new(chunk)).is_err() {
                // Consumer side already tore the queue down.
                break;
            }
        }

        // Unblock any consumer waiting in a pull; idempotent.
        self.queue.close();
    }
}
