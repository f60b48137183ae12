//! Scratch buffer pool for the decoder.
//!
//! Each decode pass rents one scratch buffer, grows it to fit the largest
//! encoded frame seen, and returns it when the pass ends, however it ends:
//! end-of-data, cancellation, an early break, or a panic unwinding through
//! the caller's loop. The return is tied to [`ScratchGuard`]'s `Drop`, so
//! it cannot be skipped.
//!
//! The pool counts rents and returns. Tests use [`ScratchPool::stats`] to
//! assert that nothing leaked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Buffers smaller than this are never handed out.
const MIN_SCRATCH_SIZE: usize = 1024;

/// How many returned buffers the pool retains for reuse.
const MAX_POOLED: usize = 8;

/// Rent/return counters, observable from tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total buffers handed out.
    pub rented: u64,
    /// Total buffers given back.
    pub returned: u64,
}

impl PoolStats {
    /// Buffers currently out on loan.
    pub fn outstanding(&self) -> u64 {
        self.rented - self.returned
    }
}

struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    rented: AtomicU64,
    returned: AtomicU64,
}

/// Shared pool of reusable scratch buffers.
///
/// Cheaply cloneable; clones share the same buffers and counters.
#[derive(Clone)]
pub struct ScratchPool {
    inner: Arc<PoolInner>,
}

impl ScratchPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(Vec::new()),
                rented: AtomicU64::new(0),
                returned: AtomicU64::new(0),
            }),
        }
    }

    /// The process-wide pool used when no explicit pool is supplied.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ScratchPool> = OnceLock::new();
        GLOBAL.get_or_init(ScratchPool::new).clone()
    }

    /// Rent a buffer of at least `min_capacity` bytes.
    ///
    /// The buffer is returned to this pool when the guard drops.
    pub fn rent(&self, min_capacity: usize) -> ScratchGuard {
        self.inner.rented.fetch_add(1, Ordering::AcqRel);
        let buf = {
            let mut free = self
                .inner
                .free
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match free.iter().position(|b| b.len() >= min_capacity) {
                Some(i) => free.swap_remove(i),
                None => vec![0u8; min_capacity.max(MIN_SCRATCH_SIZE).next_power_of_two()],
            }
        };
        ScratchGuard {
            pool: self.clone(),
            buf,
        }
    }

    /// Current rent/return counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            rented: self.inner.rented.load(Ordering::Acquire),
            returned: self.inner.returned.load(Ordering::Acquire),
        }
    }

    fn give_back(&self, buf: Vec<u8>) {
        self.inner.returned.fetch_add(1, Ordering::AcqRel);
        let mut free = self
            .inner
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if free.len() < MAX_POOLED {
            free.push(buf);
        }
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A rented scratch buffer, returned to its pool on drop.
pub struct ScratchGuard {
    pool: ScratchPool,
    buf: Vec<u8>,
}

impl ScratchGuard {
    /// Grow the buffer to hold at least `min_capacity` bytes.
    ///
    /// Returns the current buffer and rents a larger one; existing contents
    /// are not preserved.
    pub fn ensure_capacity(&mut self, min_capacity: usize) {
        if self.buf.len() < min_capacity {
            let old = std::mem::take(&mut self.buf);
            self.pool.give_back(old);
            let next = self.pool.rent(min_capacity);
            self.buf = next.take();
        }
    }

    /// The whole buffer as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// The whole buffer as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Usable size in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Detach the buffer without returning it to the pool.
    fn take(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        // Empty means the buffer was detached via `take` and is owned
        // elsewhere now; that owner's guard returns it.
        let buf = std::mem::take(&mut self.buf);
        if !buf.is_empty() {
            self.pool.give_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_meets_minimum_size() {
        let pool = ScratchPool::new();
        let guard = pool.rent(10);
        assert!(guard.capacity() >= MIN_SCRATCH_SIZE);

        let guard = pool.rent(5000);
        assert!(guard.capacity() >= 5000);
    }

    #[test]
    fn test_drop_returns_to_pool() {
        let pool = ScratchPool::new();
        {
            let _guard = pool.rent(100);
            assert_eq!(pool.stats().outstanding(), 1);
        }
        let stats = pool.stats();
        assert_eq!(stats.rented, 1);
        assert_eq!(stats.returned, 1);
    }

    #[test]
    fn test_buffers_are_reused() {
        let pool = ScratchPool::new();
        let first_ptr = {
            let guard = pool.rent(100);
            guard.as_slice().as_ptr()
        };
        let guard = pool.rent(100);
        assert_eq!(guard.as_slice().as_ptr(), first_ptr);
    }

    #[test]
    fn test_ensure_capacity_swaps_buffer() {
        let pool = ScratchPool::new();
        let mut guard = pool.rent(100);
        guard.ensure_capacity(10_000);
        assert!(guard.capacity() >= 10_000);
        drop(guard);

        // Both the original and the replacement went back.
        let stats = pool.stats();
        assert_eq!(stats.rented, stats.returned);
    }

    #[test]
    fn test_return_on_panic() {
        let pool = ScratchPool::new();
        let cloned = pool.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.rent(100);
            panic!("boom");
        });
        assert!(result.is_err());
        let stats = pool.stats();
        assert_eq!(stats.rented, 1);
        assert_eq!(stats.returned, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let pool = ScratchPool::new();
        let clone = pool.clone();
        let _guard = pool.rent(10);
        assert_eq!(clone.stats().outstanding(), 1);
    }
}
