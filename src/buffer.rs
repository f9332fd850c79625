//! Owned byte buffers moved through the bridge.
//!
//! A [`Buffer`] is exclusively owned by whichever component currently holds
//! it: the ingest pump allocates it and hands it to the queue, the consumer
//! drains it after `pull`; on egress the application hands it off and the
//! egress pump drains it to the transport. Ownership transfers, it is never
//! shared.

/// An owned, contiguous byte region with a consume cursor.
///
/// `remaining()` and `bytes()` describe the unconsumed tail; `advance()`
/// moves the cursor forward as bytes are drained (for example after a
/// partial send).
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    offset: usize,
}

impl Buffer {
    /// Wrap an owned byte vector. The cursor starts at the beginning.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }

    /// Allocate a zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    /// Total logical length, including already-consumed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether every byte has been consumed.
    pub fn is_drained(&self) -> bool {
        self.remaining() == 0
    }

    /// The unconsumed tail of the buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    /// Advance the consume cursor by `n` bytes, saturating at the end.
    pub fn advance(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.data.len());
    }

    /// Shorten the logical length to `len` bytes.
    ///
    /// Used by the ingest pump to cut a chunk-sized allocation down to the
    /// number of bytes the transport actually delivered. Has no effect if
    /// `len` is not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
        self.offset = self.offset.min(self.data.len());
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}
