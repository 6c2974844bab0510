//! Shared pool of fixed-capacity scan buffers.
//!
//! Every scan step checks a buffer out, fills it with one marker-delimited
//! segment and hands it to a [`PesPacket`](crate::pes::PesPacket); the packet
//! checks it back in when dropped or released. The lock only guards the free
//! list, never I/O.

use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<BytesMut>>>,
    capacity: usize,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
            capacity,
        }
    }

    /// Returns a recycled buffer, or allocates a new one when the free list is empty
    pub fn acquire(&self) -> BytesMut {
        if let Some(buf) = self.free.lock().pop() {
            return buf;
        }
        tracing::trace!(capacity = self.capacity, "allocating scan buffer");
        BytesMut::with_capacity(self.capacity)
    }

    /// Clears the buffer and puts it back on the free list
    pub fn release(&self, mut buf: BytesMut) {
        buf.clear();
        self.free.lock().push(buf);
    }

    /// Number of buffers currently waiting on the free list
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Capacity of every buffer handed out by this pool
    pub fn buffer_capacity(&self) -> usize {
        self.capacity
    }
}
