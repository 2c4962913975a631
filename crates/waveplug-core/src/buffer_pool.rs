//! Buffer pool for memory that must not be allocated on the audio path.
//!
//! Analyzers and synthesizers ask the pool for their sample arrays while they
//! are being reconfigured and hand them back before resizing. The set of live
//! allocations sits behind a lock; [`BufferPool::acquire`] and
//! [`BufferPool::release`] are the only operations that take it.
//!
//! # Example
//!
//! ```
//! use waveplug_core::BufferPool;
//!
//! let pool = BufferPool::new();
//! let buffer = pool.acquire::<f32>(1250).expect("allocation");
//! assert_eq!(buffer.len(), 1250);
//! assert_eq!(pool.live_count(), 1);
//!
//! pool.release(buffer).expect("buffer from this pool");
//! assert_eq!(pool.live_count(), 0);
//! ```

use crate::compat::{Arc, AtomicU64, Mutex, Ordering, Weak};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Default)]
struct PoolState {
    live: HashMap<u64, usize>,
    live_bytes: usize,
    limit_bytes: Option<usize>,
}

#[derive(Debug, Default)]
struct PoolInner {
    state: Mutex<PoolState>,
    next_id: AtomicU64,
}

impl PoolInner {
    fn forget(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        match state.live.remove(&id) {
            Some(bytes) => {
                state.live_bytes -= bytes;
                true
            }
            None => false,
        }
    }
}

/// Tracks ownership of fixed-size arrays handed to the processing components.
///
/// Cloning yields another handle to the same pool.
#[derive(Clone, Default)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool that refuses allocations once `limit_bytes` are live.
    pub fn with_limit(limit_bytes: usize) -> Self {
        let pool = Self::new();
        pool.set_limit(Some(limit_bytes));
        pool
    }

    /// Changes the byte limit. Live buffers are never revoked.
    pub fn set_limit(&self, limit_bytes: Option<usize>) {
        self.inner.state.lock().limit_bytes = limit_bytes;
    }

    /// Allocates `len` default-initialized elements.
    ///
    /// Returns `None` if the allocator or the pool limit refuses the request.
    pub fn acquire<T: Copy + Default>(&self, len: usize) -> Option<PoolBuffer<T>> {
        let bytes = len.checked_mul(std::mem::size_of::<T>())?;
        let mut state = self.inner.state.lock();

        if let Some(limit) = state.limit_bytes {
            if state.live_bytes.saturating_add(bytes) > limit {
                tracing::debug!(len, bytes, limit, "buffer pool limit reached");
                return None;
            }
        }

        let mut data: Vec<T> = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            tracing::warn!(len, bytes, "buffer allocation failed");
            return None;
        }
        data.resize(len, T::default());

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        state.live.insert(id, bytes);
        state.live_bytes += bytes;

        Some(PoolBuffer {
            id,
            data: data.into_boxed_slice(),
            pool: Arc::downgrade(&self.inner),
        })
    }

    /// Returns a buffer to the pool and frees it.
    ///
    /// A buffer acquired from another pool is handed back untouched in `Err`,
    /// and neither pool's bookkeeping changes.
    pub fn release<T>(&self, mut buffer: PoolBuffer<T>) -> Result<(), PoolBuffer<T>> {
        if !self.issued(&buffer) {
            return Err(buffer);
        }
        self.inner.forget(buffer.id);
        buffer.pool = Weak::new();
        Ok(())
    }

    fn issued<T>(&self, buffer: &PoolBuffer<T>) -> bool {
        std::ptr::eq(buffer.pool.as_ptr(), Arc::as_ptr(&self.inner))
    }

    /// Number of buffers currently handed out.
    pub fn live_count(&self) -> usize {
        self.inner.state.lock().live.len()
    }

    /// Bytes currently handed out.
    pub fn live_bytes(&self) -> usize {
        self.inner.state.lock().live_bytes
    }

    /// Whether `buffer` is live in this pool.
    pub fn owns<T>(&self, buffer: &PoolBuffer<T>) -> bool {
        self.issued(buffer) && self.inner.state.lock().live.contains_key(&buffer.id)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BufferPool")
            .field("live_count", &state.live.len())
            .field("live_bytes", &state.live_bytes)
            .field("limit_bytes", &state.limit_bytes)
            .finish()
    }
}

/// Array owned through a [`BufferPool`].
///
/// Dropping a buffer without releasing it still removes it from its pool's
/// bookkeeping.
pub struct PoolBuffer<T> {
    id: u64,
    data: Box<[T]>,
    pool: Weak<PoolInner>,
}

impl<T> Deref for PoolBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for PoolBuffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> Drop for PoolBuffer<T> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.forget(self.id);
        }
    }
}

impl<T> fmt::Debug for PoolBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuffer")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let pool = BufferPool::new();
        let a = pool.acquire::<f32>(16).unwrap();
        let b = pool.acquire::<usize>(8).unwrap();

        assert_eq!(pool.live_count(), 2);
        assert_eq!(pool.live_bytes(), 16 * 4 + 8 * std::mem::size_of::<usize>());
        assert!(a.iter().all(|&s| s == 0.0));

        assert!(pool.release(a).is_ok());
        assert!(pool.release(b).is_ok());
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.live_bytes(), 0);
    }

    #[test]
    fn test_release_foreign_buffer_fails() {
        let pool = BufferPool::new();
        let other = BufferPool::new();
        let mine = pool.acquire::<f32>(4).unwrap();
        let foreign = other.acquire::<f32>(4).unwrap();

        let foreign = pool.release(foreign).unwrap_err();
        assert_eq!(pool.live_count(), 1);
        assert!(pool.owns(&mine));
        assert_eq!(other.live_count(), 1);
        assert!(other.owns(&foreign));

        assert!(other.release(foreign).is_ok());
        assert_eq!(other.live_count(), 0);
    }

    #[test]
    fn test_release_to_wrong_pool_keeps_contents() {
        let owner = BufferPool::new();
        let stranger = BufferPool::new();
        let mut buffer = owner.acquire::<f32>(3).unwrap();
        buffer.copy_from_slice(&[0.25, 0.5, 0.75]);
        let bytes = owner.live_bytes();

        let buffer = stranger.release(buffer).unwrap_err();
        assert_eq!(&buffer[..], &[0.25, 0.5, 0.75]);
        assert_eq!(owner.live_count(), 1);
        assert_eq!(owner.live_bytes(), bytes);
        assert_eq!(stranger.live_count(), 0);
    }

    #[test]
    fn test_buffers_stay_valid_until_released() {
        let pool = BufferPool::new();
        let mut a = pool.acquire::<f32>(4).unwrap();
        a.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let b = pool.acquire::<f32>(4).unwrap();
        assert!(pool.release(b).is_ok());
        assert_eq!(&a[..], &[1.0, 2.0, 3.0, 4.0]);
        assert!(pool.owns(&a));
    }

    #[test]
    fn test_drop_forgets_buffer() {
        let pool = BufferPool::new();
        {
            let _buffer = pool.acquire::<f32>(32).unwrap();
            assert_eq!(pool.live_count(), 1);
        }
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_limit_refuses_allocation() {
        let pool = BufferPool::with_limit(64);
        let a = pool.acquire::<f32>(16).unwrap();
        assert!(pool.acquire::<f32>(1).is_none());
        assert_eq!(pool.live_count(), 1);

        assert!(pool.release(a).is_ok());
        assert!(pool.acquire::<f32>(16).is_some());
    }

    #[test]
    fn test_oversized_request_fails_cleanly() {
        let pool = BufferPool::new();
        assert!(pool.acquire::<f32>(usize::MAX).is_none());
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = BufferPool::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let buffer = pool.acquire::<f32>(1 + (t * 31 + i) % 64).unwrap();
                        assert!(pool.owns(&buffer));
                        assert!(pool.release(buffer).is_ok());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.live_bytes(), 0);
    }

    proptest! {
        #[test]
        fn prop_bookkeeping_matches_live_buffers(
            sizes in proptest::collection::vec(0usize..512, 1..32),
            release_mask in proptest::collection::vec(any::<bool>(), 32),
        ) {
            let pool = BufferPool::new();
            let mut kept = Vec::new();
            let mut kept_bytes = 0;

            for (i, &len) in sizes.iter().enumerate() {
                let buffer = pool.acquire::<f32>(len).unwrap();
                if release_mask[i] {
                    prop_assert!(pool.release(buffer).is_ok());
                } else {
                    kept_bytes += len * 4;
                    kept.push(buffer);
                }
            }

            prop_assert_eq!(pool.live_count(), kept.len());
            prop_assert_eq!(pool.live_bytes(), kept_bytes);

            for buffer in kept {
                prop_assert!(pool.release(buffer).is_ok());
            }
            prop_assert_eq!(pool.live_count(), 0);
        }
    }
}
