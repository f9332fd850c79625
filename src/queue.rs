//! Thread-safe FIFO handoff between a pump thread and the application.
//!
//! The queue is the only shared mutable state between the two sides of the
//! bridge. It is a closed-queue primitive: once [`PacketQueue::close`] has
//! been called, a blocked [`PacketQueue::dequeue`] drains whatever is still
//! queued and then returns `None` instead of waiting forever.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::buffer::Buffer;

/// Error returned by [`PacketQueue::enqueue`] once the queue is closed.
///
/// Carries the rejected buffer back to the caller so ownership is never
/// silently lost.
#[derive(Debug, Error)]
#[error("queue is closed")]
pub struct QueueClosed(pub Buffer);

#[derive(Debug)]
struct Inner {
    items: VecDeque<Buffer>,
    closed: bool,
}

/// FIFO of [`Buffer`]s with blocking dequeue and an explicit closed state.
///
/// Two flavors share the implementation:
///
/// - [`PacketQueue::unbounded`] (ingest): enqueue never blocks, so the
///   transport thread is never stalled by a slow consumer. This is
///   unbounded-memory growth if the consumer stops pulling; inherited
///   behavior, kept deliberately.
/// - [`PacketQueue::bounded`] (egress): enqueue blocks while the queue is at
///   capacity, providing backpressure toward the application's push call.
///
/// Delivery order is insertion order; there is no reordering or coalescing.
#[derive(Debug)]
pub struct PacketQueue {
    inner: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl PacketQueue {
    /// Create a queue with no capacity bound (ingest direction).
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Create a queue holding at most `capacity` buffers (egress direction).
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked holder leaves the queue structurally intact.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a buffer at the tail.
    ///
    /// Blocks while a bounded queue is at capacity. Fails once the queue is
    /// closed, returning the buffer to the caller. Wakes exactly one waiting
    /// dequeuer.
    pub fn enqueue(&self, buffer: Buffer) -> Result<(), QueueClosed> {
        let mut inner = self.lock();
        if let Some(capacity) = self.capacity {
            while inner.items.len() >= capacity && !inner.closed {
                inner = self
                    .not_full
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        if inner.closed {
            return Err(QueueClosed(buffer));
        }
        inner.items.push_back(buffer);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove and return the oldest buffer.
    ///
    /// Blocks while the queue is empty and open. Once the queue is closed
    /// and drained, returns `None` (the EOF sentinel) without blocking.
    pub fn dequeue(&self) -> Option<Buffer> {
        let mut inner = self.lock();
        while inner.items.is_empty() && !inner.closed {
            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let buffer = inner.items.pop_front();
        if buffer.is_some() {
            self.not_full.notify_one();
        }
        buffer
    }

    /// Close the queue. Idempotent.
    ///
    /// Already-queued buffers stay and can still be drained; all blocked
    /// enqueuers and dequeuers are woken.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of buffers currently queued.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether the queue currently holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = PacketQueue::unbounded();
        queue.enqueue(Buffer::from(&b"one"[..])).unwrap();
        queue.enqueue(Buffer::from(&b"two"[..])).unwrap();
        queue.enqueue(Buffer::from(&b"three"[..])).unwrap();

        assert_eq!(queue.dequeue().unwrap().bytes(), b"one");
        assert_eq!(queue.dequeue().unwrap().bytes(), b"two");
        assert_eq!(queue.dequeue().unwrap().bytes(), b"three");
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let queue = Arc::new(PacketQueue::unbounded());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.enqueue(Buffer::from(&b"late"[..])).unwrap();
            })
        };

        let buffer = queue.dequeue().expect("blocked dequeue should get the buffer");
        assert_eq!(buffer.bytes(), b"late");
        producer.join().unwrap();
    }

    #[test]
    fn test_close_wakes_blocked_dequeue() {
        let queue = Arc::new(PacketQueue::unbounded());
        let (tx, rx) = mpsc::channel();
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let result = queue.dequeue();
                tx.send(result.is_none()).unwrap();
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();

        let saw_eof = rx
            .recv_timeout(Duration::from_secs(1))
            .expect("dequeue must wake within a bounded time after close");
        assert!(saw_eof);
        consumer.join().unwrap();
    }

    #[test]
    fn test_close_drains_before_eof() {
        let queue = PacketQueue::unbounded();
        queue.enqueue(Buffer::from(&b"queued"[..])).unwrap();
        queue.close();

        // Already-queued items survive close.
        assert_eq!(queue.dequeue().unwrap().bytes(), b"queued");
        assert!(queue.dequeue().is_none());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_enqueue_after_close_returns_buffer() {
        let queue = PacketQueue::unbounded();
        queue.close();
        let rejected = queue.enqueue(Buffer::from(&b"nope"[..])).unwrap_err();
        assert_eq!(rejected.0.bytes(), b"nope");
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue = PacketQueue::bounded(4);
        queue.close();
        queue.close();
        assert!(queue.is_closed());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_bounded_enqueue_applies_backpressure() {
        let queue = Arc::new(PacketQueue::bounded(1));
        queue.enqueue(Buffer::from(&b"first"[..])).unwrap();

        let (tx, rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.enqueue(Buffer::from(&b"second"[..])).unwrap();
                tx.send(()).unwrap();
            })
        };

        // Full queue: the producer must still be blocked.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        assert_eq!(queue.dequeue().unwrap().bytes(), b"first");
        rx.recv_timeout(Duration::from_secs(1))
            .expect("enqueue must unblock once capacity frees up");
        assert_eq!(queue.dequeue().unwrap().bytes(), b"second");
        producer.join().unwrap();
    }

    #[test]
    fn test_close_wakes_blocked_enqueue() {
        let queue = Arc::new(PacketQueue::bounded(1));
        queue.enqueue(Buffer::from(&b"fill"[..])).unwrap();

        let (tx, rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let result = queue.enqueue(Buffer::from(&b"blocked"[..]));
                tx.send(result.is_err()).unwrap();
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();

        let rejected = rx
            .recv_timeout(Duration::from_secs(1))
            .expect("enqueue must wake within a bounded time after close");
        assert!(rejected);
        producer.join().unwrap();
    }
}
