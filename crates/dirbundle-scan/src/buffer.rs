//! Scoped chunk buffers.

use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};

use dirbundle_core::WalkError;

/// Hands out chunk buffers that return to the pool when dropped.
///
/// Requests above the configured limit fail instead of growing without
/// bound. Released buffers are reused by later requests of equal or
/// smaller size.
#[derive(Debug)]
pub struct BufferPool {
    limit: usize,
    free: RefCell<Vec<Vec<u8>>>,
    peak: Cell<usize>,
}

impl BufferPool {
    /// Create a pool refusing requests above `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            free: RefCell::new(Vec::new()),
            peak: Cell::new(0),
        }
    }

    /// Borrow a zeroed buffer of exactly `size` bytes.
    pub fn acquire(&self, size: usize) -> Result<PooledBuffer<'_>, WalkError> {
        if size > self.limit {
            return Err(WalkError::BufferUnavailable {
                requested: size,
                limit: self.limit,
            });
        }

        let mut data = {
            let mut free = self.free.borrow_mut();
            match free.iter().position(|buf| buf.capacity() >= size) {
                Some(i) => free.swap_remove(i),
                None => Vec::with_capacity(size),
            }
        };
        data.clear();
        data.resize(size, 0);

        self.peak.set(self.peak.get().max(size));
        Ok(PooledBuffer { pool: self, data })
    }

    /// Largest buffer handed out so far.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    /// Buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn release(&self, data: Vec<u8>) {
        self.free.borrow_mut().push(data);
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    data: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let pool = BufferPool::new(16 * 1024);
        {
            let buf = pool.acquire(4096).unwrap();
            assert_eq!(buf.len(), 4096);
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire(100).unwrap();
        assert_eq!(buf.len(), 100);
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.peak(), 4096);
    }

    #[test]
    fn test_oversized_request_fails() {
        let pool = BufferPool::new(1024);
        let err = pool.acquire(2048).unwrap_err();
        assert!(matches!(
            err,
            WalkError::BufferUnavailable {
                requested: 2048,
                limit: 1024
            }
        ));
        assert_eq!(pool.peak(), 0);
    }

    #[test]
    fn test_reused_buffer_is_zeroed() {
        let pool = BufferPool::new(64);
        {
            let mut buf = pool.acquire(8).unwrap();
            buf.copy_from_slice(b"abcdefgh");
        }
        let buf = pool.acquire(8).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }
}
