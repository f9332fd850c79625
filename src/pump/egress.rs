//! Application-to-network pump.

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::cancel::CancelToken;
use crate::queue::PacketQueue;
use crate::transport::Transport;

/// Dequeues buffers and drains each one to the transport in chunk-sized
/// sends.
///
/// A send error is transient at this layer: the remainder of the current
/// buffer is dropped with a warning and the pump moves on to the next
/// buffer. The application keeps producing, so the pump must keep
/// accepting; a dead connection is for a caller-level check to notice.
pub struct EgressPump {
    transport: Arc<dyn Transport>,
    queue: Arc<PacketQueue>,
    chunk_size: usize,
    cancel: CancelToken,
}

impl EgressPump {
    /// Assemble a pump. `run` is expected to be called on a dedicated
    /// thread.
    pub fn new(
        transport: Arc<dyn Transport>,
        queue: Arc<PacketQueue>,
        chunk_size: usize,
        cancel: CancelToken,
    ) -> Self {
        Self {
            transport,
            queue,
            chunk_size,
            cancel,
        }
    }

    /// The pump loop. Blocks in the dequeue between buffers; returns when
    /// cancelled or when the queue is closed and drained.
    pub fn run(self) {
        while !self.cancel.is_cancelled() {
            let Some(mut buffer) = self.queue.dequeue() else {
                break;
            };
            self.drain(&mut buffer);
        }
    }

    /// Send `buffer` in chunks, advancing past whatever the transport
    /// accepts. Partial sends are routine. Cancellation is observed between
    /// chunks.
    fn drain(&self, buffer: &mut Buffer) {
        while buffer.remaining() > 0 {
            if self.cancel.is_cancelled() {
                return;
            }
            let len = buffer.remaining().min(self.chunk_size);
            match self.transport.send(&buffer.bytes()[..len]) {
                Ok(sent) => buffer.advance(sent),
                Err(err) => {
                    tracing::warn!(
                        %err,
                        dropped = buffer.remaining(),
                        "send failed, dropping the rest of this buffer"
                    );
                    return;
                }
            }
        }
    }
}
