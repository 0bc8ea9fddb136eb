//! Pooled scratch buffers for the decode path
//!
//! Every load copies mapped bytes into a scratch buffer before decoding in
//! place. The pool recycles those allocations instead of paying a fresh
//! `Vec` per load. Leases are scoped: a [`PooledBuffer`] returns its
//! allocation to the shelf when dropped, on every exit path. A leased
//! buffer is never shared across threads.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Default number of idle buffers kept on the shelf.
pub const DEFAULT_POOLED_BUFFERS: usize = 8;

/// Recycling pool of byte buffers.
pub struct BufferPool {
    shelf: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
}

impl BufferPool {
    pub fn new(max_idle: usize) -> Self {
        BufferPool {
            shelf: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
        }
    }

    /// Lease a zeroed buffer of exactly `len` bytes.
    pub fn acquire(&self, len: usize) -> PooledBuffer<'_> {
        let mut buf = self.shelf.lock().pop().unwrap_or_default();
        buf.clear();
        buf.resize(len, 0);
        PooledBuffer { pool: self, buf }
    }

    /// Number of idle buffers currently on the shelf.
    pub fn idle(&self) -> usize {
        self.shelf.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut shelf = self.shelf.lock();
        if shelf.len() < self.max_idle {
            shelf.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOLED_BUFFERS)
    }
}

/// A leased scratch buffer. Dropping it returns the allocation to the pool.
pub struct PooledBuffer<'pool> {
    pool: &'pool BufferPool,
    buf: Vec<u8>,
}

impl PooledBuffer<'_> {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
